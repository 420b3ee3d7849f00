//! Human-readable and JSON rendering.

use anyhow::{Context, Result};
use colored::Colorize;
use content::{ContentAnalysis, ContentValidation};
use platforms::{CompatibilityReport, Platform, PlatformCapabilities, PublishingResult};
use scheduler::{ScheduleStatus, ScheduledContent};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

fn score(value: u32) -> String {
    let text = value.to_string();
    match value {
        80.. => text.green().to_string(),
        50..=79 => text.yellow().to_string(),
        _ => text.red().to_string(),
    }
}

fn mark(ok: bool) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

pub fn render_analysis(title: &str, analysis: &ContentAnalysis) {
    println!("{}", title.bold().cyan());
    println!("  SEO score:      {}", score(analysis.seo_score));
    println!("  Readability:    {:.1}", analysis.readability_score);
    println!(
        "  Words:          {} ({} min read)",
        analysis.word_count, analysis.reading_time_minutes
    );
    println!("  Headings score: {}", score(analysis.heading_analysis.score));
    for issue in &analysis.heading_analysis.issues {
        println!("    - {}", issue.yellow());
    }
    let links = &analysis.link_distribution;
    println!(
        "  Links:          {} internal, {} external ({:.2} per 100 words)",
        links.internal, links.external, links.links_per_100_words
    );
    let images = &analysis.image_optimization;
    println!(
        "  Images:         {} ({} missing alt text)",
        images.image_count, images.missing_alt_text
    );
    if !analysis.keyword_density.is_empty() {
        println!("  Keyword density:");
        for (keyword, density) in &analysis.keyword_density {
            println!("    {keyword}: {density:.2}%");
        }
    }
}

pub fn render_validation(validation: &ContentValidation, report: Option<&CompatibilityReport>) {
    let headline = if validation.is_valid {
        "Content is valid".green().bold()
    } else {
        "Content is invalid".red().bold()
    };
    println!("{headline}");
    for error in &validation.errors {
        println!(
            "  {} [{}] {} ({})",
            "error".red(),
            error.severity,
            error.message,
            error.code.dimmed()
        );
    }
    for warning in &validation.warnings {
        println!(
            "  {} [{}] {} ({})",
            "warning".yellow(),
            warning.impact,
            warning.message,
            warning.code.dimmed()
        );
    }

    if let Some(report) = report {
        println!();
        println!(
            "{} overall score {}",
            "Platform compatibility:".bold(),
            score(report.overall_score)
        );
        for result in &report.results {
            println!(
                "  {} {:<10} {}",
                mark(result.passed),
                result.platform.to_string(),
                score(result.score)
            );
            for error in &result.errors {
                println!("      {}", error.red());
            }
            for warning in &result.warnings {
                println!("      {}", warning.yellow());
            }
        }
    }
}

pub fn render_results(results: &[PublishingResult]) {
    for result in results {
        let target = result
            .url
            .as_deref()
            .or(result.platform_id.as_deref())
            .unwrap_or("-");
        println!(
            "{} {:<10} {}",
            mark(result.success),
            result.platform.to_string(),
            target
        );
        for error in &result.errors {
            println!("    {}", error.red());
        }
        for warning in &result.warnings {
            println!("    {}", warning.yellow());
        }
    }
}

pub fn render_platforms(rows: &[(Platform, bool, PlatformCapabilities)]) {
    println!(
        "{}",
        format!(
            "{:<10} {:<11} {:<6} {:<8} {:<9} {:>9} {:>11}",
            "Platform", "Configured", "HTML", "Updates", "Schedule", "Max title", "Max content"
        )
        .bold()
    );
    for (platform, configured, caps) in rows {
        let limit = |value: Option<usize>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
        println!(
            "{:<10} {:<11} {:<6} {:<8} {:<9} {:>9} {:>11}",
            platform.to_string(),
            mark(*configured),
            mark(caps.supports_html),
            mark(caps.supports_updates),
            mark(caps.supports_scheduling),
            limit(caps.max_title_length),
            limit(caps.max_content_length)
        );
    }
}

pub fn render_scheduled(item: &ScheduledContent) {
    let status = match item.status {
        ScheduleStatus::Completed if item.warnings.is_empty() => item.status.to_string().green(),
        ScheduleStatus::Completed | ScheduleStatus::Pending | ScheduleStatus::Processing => {
            item.status.to_string().yellow()
        }
        ScheduleStatus::Failed => item.status.to_string().red(),
    };
    println!("{} {}", item.id.dimmed(), item.content.title.bold());
    println!(
        "  status {status}, attempt {}/{}, priority {}",
        item.attempts, item.max_attempts, item.priority
    );
    println!(
        "  scheduled for {}",
        item.scheduled_time.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(error) = &item.last_error {
        println!("  {}", error.red());
    }
    for warning in &item.warnings {
        println!("  {}", warning.yellow());
    }
    if !item.results.is_empty() {
        render_results(&item.results);
    }
}
