use crate::gex::{GexReport, ProfilePoint, StrikeExposure};
use colored::Colorize;

const BAR_WIDTH: usize = 30;
const MAX_STRIKE_ROWS: usize = 25;

pub fn rule() {
    println!("{}", "=".repeat(60).blue());
}

pub fn header(title: &str) {
    rule();
    println!("{}", title.green().bold());
    rule();
    println!();
}

fn signed_bn(value: f64) -> String {
    let text = format!("{:>+9.3}", value);
    if value >= 0.0 { text.green().to_string() } else { text.red().to_string() }
}

/// Proportional text bar; negative values grow leftwards of the axis.
pub fn bar(value: f64, max_abs: f64) -> String {
    if !value.is_finite() || max_abs <= 0.0 {
        return format!("{}|{}", " ".repeat(BAR_WIDTH), " ".repeat(BAR_WIDTH));
    }
    let len = ((value.abs() / max_abs) * BAR_WIDTH as f64).round() as usize;
    let len = len.min(BAR_WIDTH);
    if value < 0.0 {
        format!("{}{}|{}", " ".repeat(BAR_WIDTH - len), "#".repeat(len), " ".repeat(BAR_WIDTH))
    } else {
        format!("{}|{}{}", " ".repeat(BAR_WIDTH), "#".repeat(len), " ".repeat(BAR_WIDTH - len))
    }
}

/// Strikes within the profile window around spot, largest absolute exposure first.
pub fn strikes_in_window(report: &GexReport, lower: f64, upper: f64) -> Vec<&StrikeExposure> {
    let mut rows: Vec<&StrikeExposure> = report
        .strikes
        .iter()
        .filter(|s| s.strike >= lower && s.strike <= upper)
        .collect();
    rows.sort_by(|a, b| b.total_exposure.abs().total_cmp(&a.total_exposure.abs()));
    rows.truncate(MAX_STRIKE_ROWS);
    rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    rows
}

pub fn display_report(report: &GexReport, lower_pct: f64, upper_pct: f64) {
    rule();
    println!("{} {}", "Gamma Exposure".cyan().bold(), report.underlying.yellow().bold());
    rule();
    println!("{} Spot: {:.2}", "✓".green(), report.spot);
    println!("{} As of: {}", "✓".green(), report.as_of);
    if let Some(ts) = &report.timestamp {
        println!("{} Feed timestamp: {}", "✓".green(), ts);
    }
    println!(
        "{} Total gamma: {} Bn per 1% move",
        "✓".green(),
        signed_bn(report.total_gamma)
    );
    match &report.flip {
        Some(flip) => println!("{} Gamma flip: {:.2}", "✓".green(), flip.price),
        None => println!("{} Gamma flip: {}", "ℹ".blue(), "none in range".yellow()),
    }
    let fmt_date = |d: Option<chrono::NaiveDate>| d.map_or("none".to_string(), |d| d.to_string());
    println!("{} Next expiry: {}", "ℹ".blue(), fmt_date(report.next_expiry));
    println!("{} Next monthly: {}", "ℹ".blue(), fmt_date(report.next_monthly_expiry));
    println!(
        "{} Paired rows: {} ({} degenerate)",
        "ℹ".blue(),
        report.paired_rows,
        report.degenerate_rows
    );
    println!();

    display_strikes(&strikes_in_window(
        report,
        report.spot * lower_pct,
        report.spot * upper_pct,
    ));
    display_profile(&report.profile);
}

fn display_strikes(rows: &[&StrikeExposure]) {
    if rows.is_empty() {
        println!("{} No strikes inside the profile window", "ℹ".blue());
        println!();
        return;
    }
    let max_abs = rows.iter().map(|s| s.total_exposure.abs()).fold(0.0, f64::max);

    println!("{}", "Exposure by strike (Bn)".cyan().bold());
    println!("{:>10} {:>9} {:>9} {:>9}", "Strike", "Calls", "Puts", "Net");
    for s in rows {
        println!(
            "{:>10.2} {} {} {} {}",
            s.strike,
            signed_bn(s.call_exposure),
            signed_bn(s.put_exposure),
            signed_bn(s.total_exposure),
            bar(s.total_exposure, max_abs).dimmed()
        );
    }
    println!();
}

fn display_profile(profile: &[ProfilePoint]) {
    if profile.is_empty() {
        return;
    }
    let max_abs = profile.iter().map(|p| p.all_expiries.abs()).fold(0.0, f64::max);

    println!("{}", "Gamma profile (Bn)".cyan().bold());
    println!("{:>10} {:>9} {:>9} {:>9}", "Level", "All", "Ex-Next", "Ex-Mthly");
    for p in profile {
        println!(
            "{:>10.2} {} {} {} {}",
            p.level,
            signed_bn(p.all_expiries),
            signed_bn(p.ex_next_expiry),
            signed_bn(p.ex_next_monthly),
            bar(p.all_expiries, max_abs).dimmed()
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_direction_and_width() {
        let full = bar(2.0, 2.0);
        assert_eq!(full.len(), BAR_WIDTH * 2 + 1);
        assert!(full.ends_with(&"#".repeat(BAR_WIDTH)));

        let half_neg = bar(-1.0, 2.0);
        assert_eq!(half_neg.matches('#').count(), BAR_WIDTH / 2);
        assert!(half_neg.find('#') < half_neg.find('|'));

        assert!(!bar(1.0, 0.0).contains('#'));
    }
}
