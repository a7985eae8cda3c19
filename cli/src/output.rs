use console::style;
use skillscout_core::{Recommendation, SearchResult, SearchResults, SkillHit, SkillRecord, SourceInfo};

pub fn print_search(results: &SearchResults, verbose: bool) {
    let total = results.local.len() + results.external.len();

    if total == 0 {
        println!(
            "{} No skills found matching '{}'",
            style("!").yellow(),
            results.query
        );
        return;
    }

    println!(
        "{} Found {} skills matching '{}'",
        style("✓").green().bold(),
        total,
        results.query
    );
    println!();

    if !results.local.is_empty() {
        println!("{}", style("Local skills (installed):").white().bold());
        for result in &results.local {
            print_result(result, verbose);
        }
        println!();
    }

    if !results.external.is_empty() {
        println!(
            "{}",
            style("External skills (available to install):").white().bold()
        );
        for result in &results.external {
            print_result(result, verbose);
        }
        println!();
    }
}

fn print_result(result: &SearchResult, verbose: bool) {
    println!(
        "  {:<28} {}",
        style(&result.record.name).white().bold(),
        style(format!("(score: {:.1})", result.score)).dim()
    );

    if verbose {
        println!("    {}", truncate(&result.record.description, 76));
        if let Some(path) = &result.record.path {
            println!("    Path: {}", path.display());
        }
        if let Some(url) = &result.record.url {
            println!("    URL:  {}", url);
        }
    }
}

pub fn print_hit(hit: &SkillHit) {
    println!("{}", style(&hit.record.name).white().bold());
    println!("  {}", hit.record.description);

    if let Some(category) = &hit.record.category {
        println!("  Category:  {}", category);
    }
    if let Some(registry) = &hit.record.registry {
        println!("  Registry:  {}", registry);
    }
    println!(
        "  Installed: {}",
        if hit.installed {
            style("yes").green()
        } else {
            style("no").yellow()
        }
    );
    if let Some(path) = &hit.record.path {
        println!("  Path:      {}", path.display());
    }
    if let Some(url) = &hit.record.url {
        println!("  URL:       {}", url);
    }

    if let Some(command) = &hit.install_command {
        println!();
        println!("Install:");
        println!("  {}", command);
    }
}

pub fn print_recommendation(recommendation: &Recommendation) {
    println!(
        "{} Recommended: {} {}",
        style("✓").green().bold(),
        style(&recommendation.record.name).white().bold(),
        style(format!("(confidence: {:.2})", recommendation.confidence)).dim()
    );
    println!("  {}", truncate(&recommendation.record.description, 76));
    println!("  Why: {}", recommendation.rationale);
    println!(
        "  Installed: {}",
        if recommendation.installed { "yes" } else { "no" }
    );

    if let Some(command) = &recommendation.install_command {
        println!();
        println!("  Install:");
        println!("  {}", command);
    }

    if !recommendation.alternatives.is_empty() {
        println!();
        println!("  Alternatives: {}", recommendation.alternatives.join(", "));
    }
}

pub fn print_sources(sources: &[SourceInfo]) {
    println!("{}", style("Local skill roots:").white().bold());
    for source in sources.iter().filter(|s| s.kind == "local") {
        let status = if source.available {
            style("✓").green()
        } else {
            style("✗").dim()
        };
        let count = match source.skills {
            Some(count) => format!("({} skills)", count),
            None => "(not found)".to_string(),
        };
        println!("  {} {} {}", status, source.location, style(count).dim());
    }

    println!();
    println!("{}", style("External registries:").white().bold());
    for source in sources.iter().filter(|s| s.kind == "registry") {
        println!("  {} {}: {}", style("•").cyan(), source.name, source.location);
    }
}

pub fn print_catalog(skills: &[SkillRecord]) {
    if skills.is_empty() {
        println!(
            "{} Catalog is empty. Run 'skillscout refresh' to index the registries.",
            style("!").yellow()
        );
        return;
    }

    println!(
        "{} {} skills in the catalog",
        style("✓").green().bold(),
        skills.len()
    );
    println!();

    for skill in skills {
        let registry = skill.registry.as_deref().unwrap_or("unknown");
        println!(
            "  {:<28} {} {}",
            style(&skill.name).white().bold(),
            style(format!("[{}]", registry)).dim(),
            truncate(&skill.description, 48)
        );
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{}...", cut.trim_end())
    }
}
