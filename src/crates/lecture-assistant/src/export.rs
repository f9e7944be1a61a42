//! Printable export of a final brief.

use crate::state::FinalBrief;
use std::fmt::Write;

/// Render a brief as a Markdown document
pub fn render_markdown(brief: &FinalBrief) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_brief(&mut out, brief);
    out
}

fn write_brief(out: &mut String, brief: &FinalBrief) -> std::fmt::Result {
    writeln!(out, "# {}\n", brief.title)?;

    writeln!(out, "## Introduction\n")?;
    writeln!(out, "{}\n", brief.introduction)?;

    writeln!(out, "## Executive Summary\n")?;
    writeln!(out, "{}\n", brief.summary)?;

    if !brief.key_findings.is_empty() {
        writeln!(out, "## Key Findings\n")?;
        for finding in &brief.key_findings {
            writeln!(out, "- {} {}", finding.finding, finding.citation)?;
            writeln!(out, "  - Source: [{}]({})", display_title(&finding.source, &finding.url), finding.url)?;
            if !finding.excerpt.is_empty() {
                writeln!(out, "  - > {}", finding.excerpt)?;
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "## Detailed Lecture Plan\n")?;
    if brief.lecture_sections.is_empty() {
        for (idx, section) in brief.lecture_plan.iter().enumerate() {
            writeln!(out, "{}. {}", idx + 1, section)?;
        }
        writeln!(out)?;
    } else {
        for section in &brief.lecture_sections {
            if section.duration.is_empty() {
                writeln!(out, "### {}\n", section.heading)?;
            } else {
                writeln!(out, "### {} ({})\n", section.heading, section.duration)?;
            }
            if !section.content.is_empty() {
                writeln!(out, "{}\n", section.content)?;
            }
            if !section.key_points.is_empty() {
                writeln!(out, "**Key points**\n")?;
                for point in &section.key_points {
                    writeln!(out, "- {point}")?;
                }
                writeln!(out)?;
            }
            if !section.teaching_notes.is_empty() {
                writeln!(out, "**Teaching notes**\n")?;
                for note in &section.teaching_notes {
                    writeln!(out, "- {note}")?;
                }
                writeln!(out)?;
            }
        }
    }

    if !brief.risks.is_empty() {
        writeln!(out, "## Risks & Limitations\n")?;
        for risk in &brief.risks {
            writeln!(out, "- {risk}")?;
        }
        writeln!(out)?;
    }

    if !brief.further_reading.is_empty() {
        writeln!(out, "## Further Reading\n")?;
        for reading in &brief.further_reading {
            writeln!(
                out,
                "- [{}]({}) (accessed {})",
                display_title(&reading.title, &reading.url),
                reading.url,
                reading.accessed
            )?;
        }
        writeln!(out)?;
    }

    let appendix = &brief.appendix;
    writeln!(out, "## Appendix\n")?;
    writeln!(out, "- Research date: {}", appendix.research_date)?;
    writeln!(out, "- Sources analyzed: {}", appendix.sources_analyzed)?;
    writeln!(out, "- Claims extracted: {}", appendix.claims_extracted)?;
    writeln!(out, "- Claims verified: {}", appendix.claims_verified)?;
    writeln!(out, "- Trace: {}", appendix.node_trace.join(" → "))
}

fn display_title<'a>(title: &'a str, url: &'a str) -> &'a str {
    if title.trim().is_empty() {
        url
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Appendix, KeyFinding, LectureSection, Reading};

    fn brief() -> FinalBrief {
        FinalBrief {
            title: "Comprehensive Lecture Plan: Optics".into(),
            introduction: "Generated lecture plan for optics based on 1 verified sources.".into(),
            summary: "Light, lenses and lasers.".into(),
            lecture_plan: vec!["Intro (10 minutes)".into(), "Lenses (15 minutes)".into()],
            lecture_sections: Vec::new(),
            key_findings: vec![KeyFinding {
                finding: "Light travels at about 3e8 m/s".into(),
                citation: "[1]".into(),
                source: String::new(),
                url: "https://physics.edu/light".into(),
                excerpt: "speed of light".into(),
            }],
            risks: vec!["Math-heavy".into()],
            further_reading: vec![Reading {
                title: "Light".into(),
                url: "https://physics.edu/light".into(),
                accessed: "March 04, 2025".into(),
            }],
            appendix: Appendix {
                node_trace: vec!["input".into(), "search".into(), "final_brief".into()],
                research_date: "March 04, 2025 at 12:00 PM".into(),
                sources_analyzed: 15,
                claims_extracted: 4,
                claims_verified: 1,
            },
        }
    }

    #[test]
    fn test_markdown_has_every_section() {
        let md = render_markdown(&brief());
        assert!(md.starts_with("# Comprehensive Lecture Plan: Optics\n"));
        for heading in [
            "## Introduction",
            "## Executive Summary",
            "## Key Findings",
            "## Detailed Lecture Plan",
            "## Risks & Limitations",
            "## Further Reading",
            "## Appendix",
        ] {
            assert!(md.contains(heading), "missing {heading}");
        }
        assert!(md.contains("1. Intro (10 minutes)"));
        assert!(md.contains("- Trace: input → search → final_brief"));
        // Untitled sources fall back to their URL
        assert!(md.contains("[https://physics.edu/light](https://physics.edu/light)"));
    }

    #[test]
    fn test_detailed_sections_replace_plan_list() {
        let mut brief = brief();
        brief.lecture_sections = vec![LectureSection {
            heading: "Lenses".into(),
            duration: "15 minutes".into(),
            content: "Refraction through curved glass.".into(),
            key_points: vec!["Focal length".into()],
            teaching_notes: vec!["Bring a magnifier".into()],
        }];
        brief.risks.clear();

        let md = render_markdown(&brief);
        assert!(md.contains("### Lenses (15 minutes)"));
        assert!(md.contains("- Focal length"));
        assert!(md.contains("- Bring a magnifier"));
        assert!(!md.contains("1. Intro"));
        assert!(!md.contains("## Risks"));
    }
}
