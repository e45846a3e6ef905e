use crate::errors::{Result, RitError};
use crate::graph;
use crate::output;
use crate::paths::RitPaths;
use crate::store::{Commit, Store};
use crate::utils::{self, formatters};
use crate::HEAD_REF;
use chrono::{TimeZone, Utc};
use colored::Colorize;

/// Prints the commit history reachable from the given refs.
///
/// With no refs, HEAD seeds the walk; `all` adds every branch. Each leaf
/// (a start that is not an ancestor of another start) yields one linear
/// chain down to the root, decorated with branch labels and ages. With
/// `full`, lines carry the full commit id and the absolute commit time.
///
/// # Errors
/// Fails with [`RitError::UnresolvableRef`] when a ref matches nothing or
/// HEAD has no commits to log.
pub fn execute(paths: &RitPaths, refs: &[String], all: bool, full: bool) -> Result<()> {
    let store = Store::new(paths.clone());

    let mut wanted: Vec<Option<String>> = if refs.is_empty() {
        vec![None]
    } else {
        refs.iter().cloned().map(Some).collect()
    };
    if all {
        wanted.extend(store.branch_names()?.into_iter().map(Some));
    }

    let mut starts: Vec<Commit> = Vec::new();
    for reference in &wanted {
        let res = graph::resolve_ref(&store, reference.as_deref())?;
        match res.commit {
            Some(commit) => starts.push(commit),
            None => {
                return Err(RitError::UnresolvableRef(
                    reference.clone().unwrap_or_else(|| HEAD_REF.to_string()),
                ));
            }
        }
    }

    let now = utils::current_timestamp();
    for chain in graph::log_chains(&store, &starts, now)? {
        if let Some(leaf) = chain.first() {
            output::info(&format!(
                "Log from {}",
                formatters::short_id(&leaf.commit.commit_id)
            ));
        }
        for entry in &chain {
            println!("{}", render(&entry.commit, &entry.labels, &entry.age, full));
        }
    }
    Ok(())
}

fn render(commit: &Commit, labels: &[String], age: &str, full: bool) -> String {
    let id = if full {
        commit.commit_id.yellow().to_string()
    } else {
        formatters::short_id(&commit.commit_id).yellow().to_string()
    };

    let decorations = if labels.is_empty() {
        String::new()
    } else {
        let colored: Vec<String> = labels
            .iter()
            .map(|label| {
                if label == HEAD_REF {
                    label.yellow().to_string()
                } else {
                    label.green().to_string()
                }
            })
            .collect();
        format!("({}) ", colored.join(", "))
    };

    let date = if full {
        let when = Utc
            .timestamp_opt(commit.create_time as i64, 0)
            .single()
            .unwrap_or_default();
        format!("[{}] ", when.format("%Y-%m-%d %H:%M:%S UTC"))
    } else {
        String::new()
    };

    format!("* {id} {date}({age}) {decorations}{}", commit.msg)
}
