use anyhow::Result;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use provider_import::{
    icon_for, import_providers, insert_providers, open_database, search_stored,
    DataQualityEngine, ImportSource, Severity,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("import") => run_import(&args[2..]),
        Some("search") => run_search(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("provider-import {}", provider_import::VERSION);
    println!();
    println!("Usage:");
    println!("  provider-import import <file...> [--db <path>]");
    println!("  provider-import search <query> [--db <path>]");
}

/// Split a `--db <path>` flag off an argument list.
fn split_db_flag(args: &[String]) -> (Vec<String>, Option<PathBuf>) {
    let mut rest = Vec::new();
    let mut db_path = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--db" {
            db_path = iter.next().map(PathBuf::from);
        } else {
            rest.push(arg.clone());
        }
    }

    (rest, db_path)
}

fn run_import(args: &[String]) -> Result<()> {
    let (files, db_path) = split_db_flag(args);

    if files.is_empty() {
        print_usage();
        return Ok(());
    }

    println!("📦 Importación de Proveedores");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let sources: Vec<ImportSource> = files
        .into_iter()
        .map(|f| ImportSource::File(PathBuf::from(f)))
        .collect();

    println!("\n📂 Processing {} source(s)...", sources.len());
    let report = import_providers(&sources);

    let m = &report.metadata;
    println!(
        "✓ Sources processed: {}/{}",
        m.processed_sources, m.total_sources
    );
    println!("✓ Records extracted: {}", m.total_records_before_dedup);
    println!(
        "✓ Unique providers: {} ({} duplicates removed)",
        m.unique_records, m.duplicates_removed
    );

    for error in &report.errors {
        println!("⚠️  {}", error);
    }

    // Data quality report before anything is committed
    let engine = DataQualityEngine::new();
    let quality = engine.validate_batch(&report.data);
    let summary = engine.batch_summary(&quality);
    println!(
        "\n🔍 Quality: {} clean, {} need review, {} critical",
        summary.clean, summary.needs_review, summary.with_critical
    );
    for q in quality.iter().filter(|q| q.needs_review) {
        for issue in q.issues.iter().filter(|i| i.severity != Severity::Info) {
            println!("   ⚠️  {}: {}", q.full_name, issue.issue);
        }
    }

    // Category breakdown
    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &report.data {
        for category in &record.categories {
            *by_category.entry(category.as_str()).or_default() += 1;
        }
    }
    if !by_category.is_empty() {
        println!("\n🏷️  Categories:");
        for (category, count) in by_category {
            println!("   {} {}: {}", icon_for(category), category, count);
        }
    }

    if let Some(db_path) = db_path {
        println!("\n💾 Saving to {}...", db_path.display());
        let mut conn = open_database(&db_path)?;
        let saved = insert_providers(&mut conn, &report.data)?;
        println!("✓ Saved {} providers", saved);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if report.success {
        println!("✅ Import complete");
    } else {
        println!("❌ Import failed: no source could be processed");
        std::process::exit(1);
    }

    Ok(())
}

fn run_search(args: &[String]) -> Result<()> {
    let (terms, db_path) = split_db_flag(args);
    let query = terms.join(" ");
    let db_path = db_path.unwrap_or_else(|| PathBuf::from("providers.db"));

    if !db_path.exists() {
        eprintln!("❌ Database not found: {}", db_path.display());
        eprintln!(
            "   Run: provider-import import <file...> --db {}",
            db_path.display()
        );
        std::process::exit(1);
    }

    let conn = open_database(&db_path)?;
    let hits = search_stored(&conn, &query, 20)?;

    println!("🔎 {} result(s) for \"{}\"", hits.len(), query);
    for record in hits {
        let tax_id = if record.tax_id.is_empty() {
            "sin RUT".to_string()
        } else {
            record.tax_id.clone()
        };
        println!(
            "   {} {} ({}) | {}",
            icon_for(record.categories.first().map(String::as_str).unwrap_or("")),
            record.full_name,
            tax_id,
            record.categories.join(", ")
        );
    }

    Ok(())
}
