use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use crate::import::ImportResult;
use lotto645_core::counter::CountReport;
use lotto645_core::generator::GenerationResult;
use lotto645_core::models::{Combination, Draw};
use lotto645_core::ranking::{Rank, RankTally, WinningNumbers};
use lotto645_core::stats::{BasicStatistics, ConsecutivePairStats, Statistics};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Date", "Numéros", "Bonus"]);
    for draw in draws {
        table.add_row(vec![
            draw.draw_no.to_string(),
            draw.date.format("%d/%m/%Y").to_string(),
            format_numbers(&draw.numbers),
            format!("{:2}", draw.bonus),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Historique chargé :");
    println!("  Lignes lues      : {}", result.total_records);
    println!("  Tirages retenus  : {}", result.draws.len());
    if result.skipped > 0 {
        println!("  Doublons ignorés : {}", result.skipped);
    }
    if result.errors > 0 {
        println!("  Lignes en erreur : {}", result.errors);
    }
}

pub fn display_stats(stats: &Statistics) {
    let basic = stats.basic();
    display_basic_stats(basic);
    if let Statistics::Advanced(advanced) = stats {
        display_consecutive(&advanced.consecutive);
    }
}

fn display_basic_stats(stats: &BasicStatistics) {
    match (stats.first_draw_no, stats.last_draw_no) {
        (Some(first), Some(last)) => println!(
            "\n📊 Statistiques sur {} tirages (n°{} à n°{}){}\n",
            stats.draw_count,
            first,
            last,
            if stats.include_bonus { ", bonus inclus" } else { "" }
        ),
        _ => {
            println!("Aucun tirage dans la fenêtre demandée.");
            return;
        }
    }

    let hot = stats.hot_numbers(6);
    let cold = stats.cold_numbers(6);

    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard"]);
    let mut rows: Vec<(u8, u32)> = stats.frequency.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (number, frequency) in rows {
        let color = if hot.contains(&number) {
            Color::Green
        } else if cold.contains(&number) {
            Color::Red
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", number)).fg(color),
            Cell::new(frequency),
            Cell::new(stats.miss_streak.get(number)),
        ]);
    }
    println!("{table}");

    println!(
        "\nImpairs / pairs : {} / {} ({:.1} % impairs)",
        stats.odd_count,
        stats.even_count,
        stats.odd_percentage()
    );
    println!(
        "Hauts / bas     : {} / {} ({:.1} % hauts)",
        stats.high_count,
        stats.low_count,
        stats.high_percentage()
    );
    println!("Chauds : {}", format_numbers(&hot));
    println!("Froids : {}", format_numbers(&cold));
}

fn display_consecutive(stats: &ConsecutivePairStats) {
    println!(
        "\n── Paires consécutives : {} au total, {} tirages concernés ──",
        stats.total_pairs, stats.draws_with_pairs
    );
    let mut pairs: Vec<(u8, u8, u32)> = stats.pair_counts.observed().collect();
    if pairs.is_empty() {
        return;
    }
    pairs.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

    let mut table = new_table(vec!["Paire", "Occurrences"]);
    for (low, high, count) in pairs.into_iter().take(10) {
        table.add_row(vec![format!("{:2} - {:2}", low, high), count.to_string()]);
    }
    println!("{table}");
}

pub fn display_count_report(report: &CountReport) {
    let mut table = new_table(vec!["Étape", "Combinaisons", "% de l'univers", "% de l'étape 1"]);
    table.add_row(vec![
        "1 · fixes / exclus".to_string(),
        report.step1.total.to_string(),
        format!("{:.4}", report.step1.percentage),
        "—".to_string(),
    ]);
    if let Some(step2) = &report.step2 {
        table.add_row(vec![
            "2 · filtres".to_string(),
            step2.total.to_string(),
            format!("{:.4}", step2.percentage),
            format!("{:.2}", step2.ratio_from_step1),
        ]);
    }
    println!("{table}");
}

pub fn display_sample(combinations: &[Combination]) {
    if combinations.is_empty() {
        return;
    }
    println!("\nPremières combinaisons retenues :");
    for combination in combinations {
        println!("  {}", combination);
    }
}

pub fn display_generation(result: &GenerationResult, seed: u64) {
    println!("\n🎲 Grilles générées (seed {}, {} tentatives)\n", seed, result.attempts);

    let mut table = new_table(vec!["#", "Numéros", "Profil", "Analyse"]);
    for (i, (generated, reasoning)) in result
        .combinations
        .iter()
        .zip(&result.reasoning)
        .enumerate()
    {
        table.add_row(vec![
            (i + 1).to_string(),
            generated.numbers.to_string(),
            generated.label.clone().unwrap_or_else(|| "—".to_string()),
            reasoning.clone(),
        ]);
    }
    println!("{table}");
}

pub fn display_rankings(tickets: &[(Combination, Rank)], winning: &WinningNumbers, tally: &RankTally) {
    println!(
        "\nTirage gagnant : {} + bonus {}\n",
        winning.numbers, winning.bonus
    );

    let mut table = new_table(vec!["#", "Grille", "Résultat"]);
    for (i, (ticket, rank)) in tickets.iter().enumerate() {
        let color = if *rank == Rank::NoWin { Color::White } else { Color::Green };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(ticket.to_string()),
            Cell::new(rank.to_string()).fg(color),
        ]);
    }
    println!("{table}");

    let mut summary = new_table(vec!["Rang", "Grilles"]);
    for rank in [Rank::First, Rank::Second, Rank::Third, Rank::Fourth, Rank::Fifth, Rank::NoWin] {
        summary.add_row(vec![rank.to_string(), tally.count(rank).to_string()]);
    }
    println!("{summary}");
    println!("{} grille(s) gagnante(s) sur {}", tally.winners(), tally.total);
}
