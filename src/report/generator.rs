//! Markdown and JSON dashboard reports.
//!
//! This module renders a [`Dashboard`] as a Markdown document, one section
//! per dashboard view, or serializes it as JSON for a chart front end.

use super::dashboard::{
    AgentsView, BacklogItem, BugsView, Dashboard, DashboardMetadata, FeedbackSample,
    LabeledCount, NegativeView, OverviewView, PositiveView, PromptCard,
};
use crate::models::{Diagnostics, RatingBucket, Sentiment, SentimentCounts};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Feedback Curation Dashboard\n\n");

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_table_of_contents(dashboard));
    output.push_str(&generate_overview_section(&dashboard.overview));
    output.push_str(&generate_agents_section(&dashboard.agents));
    output.push_str(&generate_negative_section(&dashboard.negative));
    output.push_str(&generate_backlog_section(&dashboard.backlog));
    output.push_str(&generate_positive_section(&dashboard.positive));
    output.push_str(&generate_bugs_section(&dashboard.bugs));

    if let Some(ref prompts) = dashboard.prompts {
        output.push_str(&generate_prompts_section(prompts));
    }
    if let Some(ref diagnostics) = dashboard.diagnostics {
        output.push_str(&generate_diagnostics_section(diagnostics));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records:** IM {} | NN {}\n",
        metadata.im_records, metadata.nn_records
    ));
    section.push_str(&format!(
        "- **Resolved Items:** {}\n",
        metadata.resolved_items
    ));
    section.push_str(&format!(
        "- **Rating Source:** {}\n",
        metadata.rating_source
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(dashboard: &Dashboard) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Overview](#overview)\n");
    toc.push_str("- [Agent Ranking](#agent-ranking)\n");
    toc.push_str("- [Negative Feedback](#negative-feedback)\n");
    toc.push_str("- [Product Backlog](#product-backlog)\n");
    toc.push_str("- [Positive Feedback](#positive-feedback)\n");
    toc.push_str("- [Bug Reports](#bug-reports)\n");

    if dashboard.prompts.is_some() {
        toc.push_str("- [Prompt Improvements](#prompt-improvements)\n");
    }
    if dashboard.diagnostics.is_some() {
        toc.push_str("- [Data Quality](#data-quality)\n");
    }

    toc.push('\n');

    toc
}

fn sentiment_table(rows: &[(&str, &SentimentCounts)]) -> String {
    let mut table = String::from("| |");
    for sentiment in Sentiment::ALL {
        table.push_str(&format!(" {} {} |", sentiment.emoji(), sentiment));
    }
    table.push_str(" **Total** |\n|:---|");
    table.push_str(&":---:|".repeat(Sentiment::ALL.len() + 1));
    table.push('\n');

    for (name, counts) in rows {
        table.push_str(&format!("| {} |", name));
        for sentiment in Sentiment::ALL {
            table.push_str(&format!(" {} |", counts.get(sentiment)));
        }
        table.push_str(&format!(" **{}** |\n", counts.total()));
    }
    table.push('\n');

    table
}

fn count_table(header: &str, rows: &[LabeledCount]) -> String {
    let mut table = String::new();

    table.push_str(&format!("| {} | Count |\n", header));
    table.push_str("|:---|:---:|\n");
    for row in rows {
        table.push_str(&format!("| {} | {} |\n", row.label, row.count));
    }
    table.push('\n');

    table
}

/// Generate the overview section.
fn generate_overview_section(overview: &OverviewView) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str(&format!(
        "- **Total Items:** {} (recounted: {})\n",
        overview.total_items, overview.recomputed_total_items
    ));
    section.push_str(&format!(
        "- **Annotator Agreement:** {:.1}% (recounted: {:.1}%)\n",
        overview.agreement_pct, overview.recomputed_agreement_pct
    ));
    section.push_str(&format!(
        "- **Positive:** {} | **Negative:** {}\n\n",
        overview.consensus_distribution.positive, overview.consensus_distribution.negative
    ));

    section.push_str("### Sentiment Distribution\n\n");
    section.push_str(&sentiment_table(&[
        ("Consensus", &overview.consensus_distribution),
        ("Consensus (recounted)", &overview.recomputed_consensus_distribution),
        ("IM", &overview.im_distribution),
        ("NN", &overview.nn_distribution),
    ]));

    if !overview.disagreements.is_empty() {
        section.push_str("### Annotator Disagreements\n\n");
        section.push_str(&count_table("Kind", &overview.disagreements));
    }
    if !overview.recomputed_disagreements.is_empty() {
        section.push_str("### Annotator Disagreements (recounted)\n\n");
        section.push_str(&count_table("Kind", &overview.recomputed_disagreements));
    }

    section
}

/// Generate the agent ranking section.
fn generate_agents_section(agents: &AgentsView) -> String {
    let mut section = String::new();

    section.push_str("## Agent Ranking\n\n");

    if agents.ranking.is_empty() {
        section.push_str("No ranking data available.\n\n");
    } else {
        section.push_str("### Average Helpfulness (1-4)\n\n");
        section.push_str("| # | Agent | Avg Score | +/- |");
        for bucket in RatingBucket::ALL {
            section.push_str(&format!(" {} |", bucket));
        }
        section.push_str(" Rated |");
        section.push_str("\n|:---:|:---|:---:|:---:|");
        section.push_str(&":---:|".repeat(RatingBucket::ALL.len() + 1));
        section.push('\n');

        for (i, row) in agents.ranking.iter().enumerate() {
            let entry = &row.ranked.entry;
            section.push_str(&format!(
                "| {} | {} | {} {:.2} | +{} / -{} |",
                i + 1,
                row.label,
                row.ranked.band.emoji(),
                entry.avg_score,
                entry.positive_count,
                entry.negative_count
            ));
            for bucket in RatingBucket::ALL {
                section.push_str(&format!(" {} |", row.ranked.ratings.get(bucket)));
            }
            section.push_str(&format!(" **{}** |\n", row.ranked.ratings.total()));
        }
        section.push('\n');
    }

    if !agents.sentiment.is_empty() {
        section.push_str("### Sentiment by Agent\n\n");
        let rows: Vec<(&str, &SentimentCounts)> = agents
            .sentiment
            .iter()
            .map(|row| (row.label.as_str(), &row.precomputed))
            .collect();
        section.push_str(&sentiment_table(&rows));

        let differing: Vec<_> = agents
            .sentiment
            .iter()
            .filter(|row| row.precomputed != row.recomputed)
            .collect();
        if !differing.is_empty() {
            section.push_str("#### Recounted (differs from precomputed)\n\n");
            let rows: Vec<(&str, &SentimentCounts)> = differing
                .iter()
                .map(|row| (row.label.as_str(), &row.recomputed))
                .collect();
            section.push_str(&sentiment_table(&rows));
        }
    }

    section
}

fn generate_sample_block(sample: &FeedbackSample) -> String {
    let label = |l: Option<Sentiment>| l.map(|s| s.as_str()).unwrap_or("-");

    let mut block = format!(
        "**{}** · Agents: {} · IM: `{}` NN: `{}`\n\n",
        sample.item_id,
        sample.agents,
        label(sample.im_label),
        label(sample.nn_label)
    );
    for line in sample.text.lines() {
        block.push_str(&format!("> {}\n", line));
    }
    block.push_str("\n---\n\n");

    block
}

/// Generate the negative feedback section.
fn generate_negative_section(negative: &NegativeView) -> String {
    let mut section = String::new();

    section.push_str("## Negative Feedback\n\n");
    section.push_str(&format!(
        "| Total | Research Flaw | Prompt/Context | Engineering Change |\n\
         |:---:|:---:|:---:|:---:|\n\
         | {} | {} | {} | {} |\n\n",
        negative.total,
        negative.research_flaw_count,
        negative.prompt_context_count,
        negative.engineering_change_count
    ));

    if !negative.categories.is_empty() {
        section.push_str("### Categories\n\n");
        section.push_str(&count_table("Category", &negative.categories));
    }
    if !negative.by_agent.is_empty() {
        section.push_str("### Negative Feedback by Agent\n\n");
        section.push_str(&count_table("Agent", &negative.by_agent));
    }

    if !negative.samples.is_empty() {
        section.push_str(&format!(
            "### Sample Negative Feedback (first {})\n\n",
            negative.samples.len()
        ));
        for sample in &negative.samples {
            section.push_str(&generate_sample_block(sample));
        }
    }

    section
}

/// Generate the product backlog section.
fn generate_backlog_section(backlog: &[BacklogItem]) -> String {
    let mut section = String::new();

    section.push_str("## Product Backlog\n\n");

    if backlog.is_empty() {
        section.push_str("No backlog items.\n\n");
        return section;
    }

    for item in backlog {
        section.push_str(&format!(
            "### P{} {} ({} feedback items)\n\n",
            item.priority, item.label, item.count
        ));
        if !item.description.is_empty() {
            section.push_str(&format!("{}\n\n", item.description));
        }
    }

    section
}

/// Generate the positive feedback section.
fn generate_positive_section(positive: &PositiveView) -> String {
    let mut section = String::new();

    section.push_str("## Positive Feedback\n\n");
    section.push_str(&format!("- **Total:** {}\n\n", positive.total));

    if !positive.themes.is_empty() {
        section.push_str("### Themes\n\n");
        section.push_str(&count_table("Theme", &positive.themes));
    }
    if !positive.by_agent.is_empty() {
        section.push_str("### Positive Feedback by Agent\n\n");
        section.push_str(&count_table("Agent", &positive.by_agent));
    }

    section
}

/// Generate the bug reports section.
fn generate_bugs_section(bugs: &BugsView) -> String {
    let mut section = String::new();

    section.push_str("## Bug Reports\n\n");
    section.push_str(&format!("- **Total:** {}\n\n", bugs.total));

    if !bugs.by_agent.is_empty() {
        section.push_str(&count_table("Agent", &bugs.by_agent));
    }

    section
}

fn generate_prompt_card(card: &PromptCard) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}\n\n", card.label));
    block.push_str(&format!(
        "*{} {} · Avg score: {:.2} · +{} / -{}*\n\n",
        card.band.emoji(),
        card.band,
        card.avg_score,
        card.positive_count,
        card.negative_count
    ));
    if !card.summary.is_empty() {
        block.push_str(&format!("{}\n\n", card.summary));
    }

    if !card.issues.is_empty() {
        block.push_str("#### Issues Identified from Feedback\n\n");
        for issue in &card.issues {
            block.push_str(&format!("- {}\n", issue));
        }
        block.push('\n');
    }

    if !card.prompts.is_empty() {
        block.push_str("#### Suggested Prompt Additions\n\n");
        for (i, prompt) in card.prompts.iter().enumerate() {
            block.push_str(&format!("{}. ```\n{}\n```\n", i + 1, prompt.text));
            if !prompt.rationale.is_empty() {
                block.push_str(&format!("   > 💡 {}\n", prompt.rationale));
            }
            block.push('\n');
        }
    }

    block
}

/// Generate the prompt improvements section.
fn generate_prompts_section(prompts: &[PromptCard]) -> String {
    let mut section = String::new();

    section.push_str("## Prompt Improvements\n\n");
    for card in prompts {
        section.push_str(&generate_prompt_card(card));
    }

    section
}

/// Generate the data quality section.
fn generate_diagnostics_section(diagnostics: &Diagnostics) -> String {
    let mut section = String::new();

    section.push_str("## Data Quality\n\n");

    if diagnostics.is_clean() {
        section.push_str("No data quality issues found. ✅\n\n");
        return section;
    }

    section.push_str("| Check | Count |\n|:---|:---:|\n");
    section.push_str(&format!("| Only in IM | {} |\n", diagnostics.im_only.len()));
    section.push_str(&format!("| Only in NN | {} |\n", diagnostics.nn_only.len()));
    section.push_str(&format!(
        "| Unresolvable (no label) | {} |\n",
        diagnostics.unresolvable.len()
    ));
    section.push_str(&format!(
        "| Precomputed mismatches | {} |\n\n",
        diagnostics.mismatches.len()
    ));

    let id_lists = [
        ("Only in IM", &diagnostics.im_only),
        ("Only in NN", &diagnostics.nn_only),
        ("Unresolvable", &diagnostics.unresolvable),
    ];
    for (title, ids) in id_lists {
        if !ids.is_empty() {
            section.push_str(&format!("**{}:** {}\n\n", title, ids.join(", ")));
        }
    }

    if !diagnostics.warnings.is_empty() {
        section.push_str("### Warnings\n\n");
        for warning in &diagnostics.warnings {
            section.push_str(&format!("- ⚠️ {}\n", warning));
        }
        section.push('\n');
    }

    if !diagnostics.mismatches.is_empty() {
        section.push_str("### Precomputed vs Recounted\n\n");
        section.push_str("| Metric | Key | Precomputed | Recounted |\n");
        section.push_str("|:---|:---|:---:|:---:|\n");
        for m in &diagnostics.mismatches {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                m.metric, m.key, m.precomputed, m.recomputed
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by curation-dashboard v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisOptions};
    use crate::config::Config;
    use crate::loader::Corpus;
    use crate::models::{AgentRankEntry, FeedbackItem, Mismatch, PromptAddition, PromptSuggestion};
    use crate::report::build_dashboard;

    fn create_test_dashboard() -> Dashboard {
        let mut item = FeedbackItem::new("fb-1", Some(Sentiment::Negative));
        item.feedback_text = "Output is far too long\nand repetitive".to_string();
        item.related_agents_label = vec!["scope".to_string()];
        item.agent_ratings
            .insert("scope".to_string(), RatingBucket::SlightlyHelpful);

        let mut corpus = Corpus {
            im: vec![item.clone()],
            nn: vec![item],
            prompts: Some(vec![PromptSuggestion {
                agent: "scope".to_string(),
                avg_score: 1.99,
                negative_count: 12,
                positive_count: 6,
                summary: "Often misjudges journal scope.".to_string(),
                issues: vec!["Ignores journal aims".to_string()],
                prompts: vec![PromptAddition {
                    text: "Read the journal aims first.".to_string(),
                    rationale: "Most frequent complaint.".to_string(),
                }],
            }]),
            ..Corpus::default()
        };
        corpus.results.inter_annotator.total_items = 1;
        corpus.results.inter_annotator.agreement_pct = 100.0;
        corpus.results.consensus_distribution.negative = 1;
        corpus.results.agent_helpfulness_ranking = vec![AgentRankEntry {
            agent: "scope".to_string(),
            avg_score: 1.99,
            positive_count: 6,
            negative_count: 12,
        }];
        corpus.results.engineering_backlog.priority_order = vec!["format_length".to_string()];
        corpus
            .results
            .engineering_backlog
            .subcategories
            .insert("format_length".to_string(), 7);

        let analysis = analyze(&corpus, &AnalysisOptions::default());
        build_dashboard(&corpus, &analysis, &Config::default())
    }

    #[test]
    fn test_generate_markdown_report() {
        let dashboard = create_test_dashboard();
        let markdown = generate_markdown_report(&dashboard);

        assert!(markdown.contains("# Feedback Curation Dashboard"));
        assert!(markdown.contains("## Overview"));
        assert!(markdown.contains("## Agent Ranking"));
        assert!(markdown.contains("| 1 | Scope | 🔴 1.99 | +6 / -12 |"));
        assert!(markdown.contains(" N/A | Rated |"));
        assert!(markdown.contains("+6 / -12 | 0 | 0 | 1 | 0 | 0 | **1** |"));
        assert!(markdown.contains("### P1 Format & Length (7 feedback items)"));
        assert!(markdown.contains("## Prompt Improvements"));
        assert!(markdown.contains("Read the journal aims first."));
        assert!(markdown.contains("[Data Quality](#data-quality)"));
    }

    #[test]
    fn test_sample_block_quotes_every_line() {
        let dashboard = create_test_dashboard();
        let block = generate_sample_block(&dashboard.negative.samples[0]);

        assert!(block.contains("**fb-1** · Agents: Scope"));
        assert!(block.contains("> Output is far too long\n> and repetitive\n"));
    }

    #[test]
    fn test_diagnostics_section() {
        let clean = generate_diagnostics_section(&Diagnostics::default());
        assert!(clean.contains("No data quality issues found"));

        let diagnostics = Diagnostics {
            nn_only: vec!["x9".to_string()],
            mismatches: vec![Mismatch {
                metric: "total_items".to_string(),
                key: "all".to_string(),
                precomputed: "330".to_string(),
                recomputed: "329".to_string(),
            }],
            ..Diagnostics::default()
        };
        let section = generate_diagnostics_section(&diagnostics);
        assert!(section.contains("| Only in NN | 1 |"));
        assert!(section.contains("**Only in NN:** x9"));
        assert!(section.contains("| total_items | all | 330 | 329 |"));
    }

    #[test]
    fn test_sentiment_table_totals() {
        let counts = SentimentCounts {
            positive: 2,
            neutral: 1,
            negative: 0,
            bug: 3,
        };
        let table = sentiment_table(&[("IM", &counts)]);
        assert!(table.contains("| IM | 2 | 1 | 0 | 3 | **6** |"));
    }

    #[test]
    fn test_generate_json_report() {
        let dashboard = create_test_dashboard();
        let json = generate_json_report(&dashboard).unwrap();

        assert!(json.contains("\"overview\""));
        assert!(json.contains("\"ranking\""));
        assert!(json.contains("\"Slightly helpful\": 1"));
        assert!(json.contains("\"font_family\""));
    }
}
