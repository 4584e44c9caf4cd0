//! Display names for the opaque keys used in the data files.
//!
//! Unknown keys fall back to the key itself.

use std::collections::BTreeMap;

pub fn agent_label(agent: &str, overrides: &BTreeMap<String, String>) -> String {
    if let Some(label) = overrides.get(agent) {
        return label.clone();
    }

    match agent {
        "novelty" => "Novelty",
        "scope" => "Scope",
        "ethics" => "Ethics",
        "methodology_reporting" => "Methodology Reporting",
        "methodology_validation" => "Methodology Validation",
        "integrity" => "Integrity",
        other => other,
    }
    .to_string()
}

pub fn negative_category_label(key: &str) -> &str {
    match key {
        "engineering_change" => "Engineering Change",
        "prompt_context_improvement" => "Prompt/Context",
        "research_flaw" => "Research Flaw",
        "other" => "Other",
        other => other,
    }
}

pub fn backlog_label(key: &str) -> &str {
    match key {
        "format_length" => "Format & Length",
        "integration_workflow" => "Integration & Workflow",
        "duplication_redundancy" => "Duplication & Redundancy",
        "depth_detail" => "Depth & Detail",
        "summary_key_points" => "Summary & Key Points",
        "references_citations" => "References & Citations",
        "performance" => "Performance",
        "other_engineering" => "Other",
        other => other,
    }
}

pub fn backlog_description(key: &str) -> &'static str {
    match key {
        "format_length" => "Improve output formatting: allow configurable length, use bullet points, better structure with headings. Many users found agent output overwhelming and hard to scan.",
        "integration_workflow" => "Better workflow integration: export to PDF/Word, reviewer-friendly navigation, UI improvements. Editors want the tool to fit into their existing review process.",
        "duplication_redundancy" => "Reduce repetition across agents, deduplicate overlapping findings. Multiple agents often flag the same issue in different ways.",
        "depth_detail" => "Increase depth and specificity of agent analysis, provide more actionable detail. Some feedback called analysis 'superficial' or 'shallow'.",
        "summary_key_points" => "Add executive summary / key findings section at the top of each agent report. Editors want a quick overview before diving into details.",
        "references_citations" => "Improve citation linking, provide direct references to manuscript sections. Make it easy to verify agent claims against the source.",
        "performance" => "Improve agent response times, add progress indicators, handle timeouts gracefully.",
        "other_engineering" => "Miscellaneous engineering feedback that doesn't fit the above categories.",
        _ => "",
    }
}

pub fn positive_theme_label(key: &str) -> &str {
    match key {
        "useful_insights" => "Useful Insights",
        "agrees_with_reviewer" => "Agrees with Reviewer",
        "effective_identification" => "Effective Identification",
        "time_saving" => "Time Saving",
        "thorough_analysis" => "Thorough Analysis",
        "educational" => "Educational",
        "other_positive" => "Other",
        other => other,
    }
}
