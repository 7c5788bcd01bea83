use crate::scanner::{Action, RankedContract, TickerOutcome, TickerReport};
use colored::Colorize;
use std::fmt::Write;

/// Human-readable report, one block per ticker
pub fn render_text(reports: &[TickerReport]) -> String {
    let mut out = String::new();
    for report in reports {
        render_ticker(&mut out, report);
        out.push('\n');
    }
    out
}

pub fn render_json(reports: &[TickerReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

fn render_ticker(out: &mut String, report: &TickerReport) {
    let header = format!("=== {} ({}) ===", report.symbol, report.as_of);
    let _ = writeln!(out, "{}", header.cyan().bold());

    match &report.outcome {
        TickerOutcome::Failed { error } => {
            let _ = writeln!(out, "{} {}", "✗".red(), error.red());
        }
        TickerOutcome::Analyzed { underlying_price, signal_date, action, .. } => {
            let _ = writeln!(
                out,
                "{} Last close {:.2} on {}",
                "ℹ".blue(),
                underlying_price,
                signal_date
            );
            render_action(out, action);
        }
    }
}

fn render_action(out: &mut String, action: &Action) {
    match action {
        Action::BuyPut { candidates } => {
            let _ = writeln!(out, "{}", "→ Signal: BUY PUT".green().bold());
            render_candidates(out, "put", "", candidates);
        }
        Action::ReviewOpenPuts => {
            let _ = writeln!(out, "{}", "→ Signal: SELL (CLOSE) OPEN PUT(S)".yellow().bold());
            let _ = writeln!(out, "  [Manually review open puts and exit per strategy rules.]");
        }
        Action::Harvest { candidates } => {
            let _ = writeln!(out, "{}", "→ No put entry/exit signal.".blue());
            let _ = writeln!(out, "  In harvest mode. Suggest selling covered calls.");
            render_candidates(out, "call", " (OTM)", candidates);
        }
        Action::Hold => {
            let _ = writeln!(out, "{}", "→ No put entry/exit signal.".blue());
            let _ = writeln!(out, "  {}", "Holding; no action recommended.".yellow());
        }
    }
}

fn render_candidates(out: &mut String, kind: &str, note: &str, candidates: &[RankedContract]) {
    if candidates.is_empty() {
        let _ = writeln!(out, "  No eligible {} contracts found.", kind);
        return;
    }

    let _ = writeln!(out, "Top {} {} candidates{}:", candidates.len(), kind, note);
    for c in candidates {
        let contract = &c.candidate.contract;
        let delta = contract
            .delta
            .map(|d| format!("{:.2}", d))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = write!(
            out,
            "  • {} | DTE={} | Strike={:.2} | Premium≈{:.2} | Δ≈{}",
            contract.contract_symbol.yellow(),
            c.candidate.days_to_expiry,
            contract.strike,
            c.premium,
            delta
        );
        if let Some(n) = c.max_contracts {
            let _ = write!(out, " | Max contracts={}", n);
        }
        out.push('\n');
    }
}
