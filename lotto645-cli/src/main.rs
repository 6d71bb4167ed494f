mod config;
mod display;
mod import;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

use lotto645_core::cancel::Cancellation;
use lotto645_core::counter::{count_combinations, enumerate_combinations};
use lotto645_core::generator::{PatternFilter, ProfileOptions, DEFAULT_MISSING_THRESHOLD, generate};
use lotto645_core::models::{Combination, ConstraintSet, DEFAULT_HIGH_THRESHOLD, Draw, FixedExcluded};
use lotto645_core::ranking::{Rank, RankTally, WinningNumbers, aggregate_rankings, calculate_ranking};
use lotto645_core::stats::{StatsOptions, StatsStyle, basic_statistics, compute_statistics};

use crate::config::{load_constraints, load_pattern_filter, merge_profile};
use crate::display::{
    display_count_report, display_draws, display_generation, display_import_summary,
    display_rankings, display_sample, display_stats,
};
use crate::import::{ImportResult, load_draws, load_tickets};

const DEFAULT_HISTORY: &str = "data/lotto645.csv";

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum StyleArg {
    #[default]
    Basic,
    Advanced,
}

impl From<StyleArg> for StatsStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Basic => StatsStyle::Basic,
            StyleArg::Advanced => StatsStyle::Advanced,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TicketCount {
    #[value(name = "5")]
    Five,
    #[value(name = "10")]
    Ten,
}

impl TicketCount {
    fn get(self) -> usize {
        match self {
            TicketCount::Five => 5,
            TicketCount::Ten => 10,
        }
    }
}

#[derive(Parser)]
#[command(name = "lotto645", about = "Filtrage et statistiques de combinaisons loto 6/45")]
struct Cli {
    /// Journalisation détaillée (équivaut à RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lister les derniers tirages de l'historique
    List {
        /// Chemin vers le fichier CSV des tirages
        #[arg(short, long, default_value = DEFAULT_HISTORY)]
        file: PathBuf,

        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Statistiques de fréquence, de retard et de répartition
    Stats {
        #[arg(short, long, default_value = DEFAULT_HISTORY)]
        file: PathBuf,

        #[arg(short, long, default_value = "basic")]
        style: StyleArg,

        /// Compter aussi le numéro bonus
        #[arg(long)]
        include_bonus: bool,

        /// Premier numéro de tirage de la fenêtre
        #[arg(long)]
        from: Option<u32>,

        /// Dernier numéro de tirage de la fenêtre
        #[arg(long)]
        to: Option<u32>,

        /// Plus petit numéro considéré comme « haut » (exclu)
        #[arg(long, default_value_t = DEFAULT_HIGH_THRESHOLD)]
        high_threshold: u8,

        #[arg(long)]
        json: bool,
    },

    /// Compter les combinaisons restantes après fixes, exclus et filtres
    Count {
        /// Numéros imposés (ex: 1,2,3)
        #[arg(long, value_delimiter = ',')]
        fixed: Vec<u8>,

        /// Numéros interdits (ex: 4,5)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<u8>,

        /// Fichier JSON de filtres (somme, pair/impair, haut/bas, AC)
        #[arg(long)]
        filters: Option<PathBuf>,

        /// Délai maximal en secondes
        #[arg(long)]
        timeout: Option<u64>,

        /// Afficher les N premières combinaisons retenues
        #[arg(long)]
        sample: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Générer des grilles selon un profil statistique
    Generate {
        /// Historique servant à déduire le profil (chauds, froids, absents)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Nombre de grilles
        #[arg(short, long, default_value = "5")]
        count: TicketCount,

        /// Fichier JSON de profil
        #[arg(long)]
        filters: Option<PathBuf>,

        /// Nombre de numéros chauds retenus
        #[arg(long, default_value = "6")]
        hot: usize,

        /// Nombre de numéros froids retenus
        #[arg(long, default_value = "6")]
        cold: usize,

        /// Retard à partir duquel un numéro est écarté (0 pour désactiver)
        #[arg(long, default_value_t = DEFAULT_MISSING_THRESHOLD)]
        missing_threshold: u32,

        /// Seed pour la reproductibilité (défaut : date du jour)
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        json: bool,
    },

    /// Classer des grilles face à un tirage
    Rank {
        /// Fichier de grilles, une par ligne
        #[arg(short, long)]
        tickets: PathBuf,

        /// Numéros gagnants (ex: 3,11,19,27,35,43)
        #[arg(long, value_delimiter = ',', requires = "bonus")]
        winning: Vec<u8>,

        #[arg(long)]
        bonus: Option<u8>,

        /// Historique où chercher le tirage
        #[arg(short, long, conflicts_with = "winning")]
        file: Option<PathBuf>,

        /// Numéro du tirage de référence (défaut : le plus récent)
        #[arg(long, requires = "file")]
        draw: Option<u32>,

        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { Level::DEBUG } else { Level::WARN };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::List { file, last } => cmd_list(&file, last),
        Command::Stats {
            file,
            style,
            include_bonus,
            from,
            to,
            high_threshold,
            json,
        } => {
            let options = StatsOptions {
                include_bonus,
                draw_range: draw_range(from, to),
                high_threshold,
            };
            cmd_stats(&file, &options, style.into(), json)
        }
        Command::Count {
            fixed,
            exclude,
            filters,
            timeout,
            sample,
            json,
        } => cmd_count(FixedExcluded::new(fixed, exclude), filters.as_deref(), timeout, sample, json),
        Command::Generate {
            file,
            count,
            filters,
            hot,
            cold,
            missing_threshold,
            seed,
            json,
        } => {
            let profile = ProfileOptions {
                hot_count: hot,
                cold_count: cold,
                missing_threshold,
                ..Default::default()
            };
            cmd_generate(file.as_deref(), count.get(), filters.as_deref(), &profile, seed, json)
        }
        Command::Rank {
            tickets,
            winning,
            bonus,
            file,
            draw,
            json,
        } => cmd_rank(&tickets, &winning, bonus, file.as_deref(), draw, json),
    }
}

/// Génère un seed déterministe basé sur la date du jour (YYYYMMDD).
fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    today.year() as u64 * 10_000 + today.month() as u64 * 100 + today.day() as u64
}

/// Une borne absente prend la valeur extrême.
fn draw_range(from: Option<u32>, to: Option<u32>) -> Option<(u32, u32)> {
    match (from, to) {
        (None, None) => None,
        (from, to) => Some((from.unwrap_or(1), to.unwrap_or(u32::MAX))),
    }
}

fn load_history(path: &Path) -> Result<ImportResult> {
    let result = load_draws(path)?;
    info!(
        "{} tirages chargés depuis {:?} ({} doublons, {} erreurs)",
        result.draws.len(),
        path,
        result.skipped,
        result.errors
    );
    if result.draws.is_empty() {
        bail!("Aucun tirage valide dans {:?}", path);
    }
    Ok(result)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_list(file: &Path, last: usize) -> Result<()> {
    let history = load_history(file)?;
    display_import_summary(&history);
    println!();
    let shown = last.min(history.draws.len());
    display_draws(&history.draws[..shown]);
    Ok(())
}

fn cmd_stats(file: &Path, options: &StatsOptions, style: StatsStyle, json: bool) -> Result<()> {
    let history = load_history(file)?;
    let stats = compute_statistics(&history.draws, options, style)?;
    if json {
        return print_json(&stats);
    }
    display_stats(&stats);
    Ok(())
}

fn counting_spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Énumération des combinaisons...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn cmd_count(
    selection: FixedExcluded,
    filters: Option<&Path>,
    timeout: Option<u64>,
    sample: Option<usize>,
    json: bool,
) -> Result<()> {
    let constraints = filters.map(load_constraints).transpose()?;
    let cancel = match timeout {
        Some(secs) => Cancellation::none().with_timeout(Duration::from_secs(secs)),
        None => Cancellation::none(),
    };

    let spinner = if json { None } else { Some(counting_spinner()?) };
    let report = count_combinations(&selection, constraints.as_ref(), &cancel);
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let report = report.context("Comptage interrompu")?;

    let samples = match sample {
        Some(limit) => enumerate_combinations(&selection, constraints.as_ref(), limit, &cancel)?,
        None => Vec::new(),
    };

    if json {
        #[derive(Serialize)]
        struct CountOutput<'a> {
            #[serde(flatten)]
            report: &'a lotto645_core::counter::CountReport,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            sample: Vec<Combination>,
        }
        return print_json(&CountOutput {
            report: &report,
            sample: samples,
        });
    }

    display_count_report(&report);
    display_sample(&samples);
    Ok(())
}

fn cmd_generate(
    file: Option<&Path>,
    count: usize,
    filters: Option<&Path>,
    profile: &ProfileOptions,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let user = match filters {
        Some(path) => load_pattern_filter(path)?,
        None => PatternFilter::default(),
    };

    let filter = match file {
        Some(path) => {
            let history = load_history(path)?;
            let stats = basic_statistics(&history.draws, &StatsOptions::default())?;
            let derived = PatternFilter::from_statistics(
                &stats,
                history.draws.first(),
                ConstraintSet::default(),
                profile,
            );
            merge_profile(user, derived)
        }
        None => user,
    };
    debug!("Profil de génération : {:?}", filter);

    let seed = seed.unwrap_or_else(date_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let result = generate(&filter, count, &mut rng, &Cancellation::none())
        .context("Impossible de générer les grilles demandées")?;

    if json {
        return print_json(&result);
    }
    display_generation(&result, seed);
    Ok(())
}

fn resolve_winning(
    winning: &[u8],
    bonus: Option<u8>,
    file: Option<&Path>,
    draw: Option<u32>,
) -> Result<WinningNumbers> {
    if let Some(path) = file {
        let history = load_history(path)?;
        let found: Option<&Draw> = match draw {
            Some(no) => history.draws.iter().find(|d| d.draw_no == no),
            None => history.draws.first(),
        };
        let found = found.with_context(|| format!("Tirage {:?} introuvable dans {:?}", draw, path))?;
        return Ok(WinningNumbers::from(found));
    }

    let Some(bonus) = bonus else {
        bail!("Indiquez --winning et --bonus, ou --file");
    };
    let numbers = Combination::new(winning).context("Numéros gagnants invalides")?;
    Ok(WinningNumbers::new(numbers, bonus)?)
}

fn rank_tickets(tickets: &[Combination], winning: &WinningNumbers) -> (Vec<(Combination, Rank)>, RankTally) {
    let ranked = tickets
        .iter()
        .map(|ticket| (*ticket, calculate_ranking(ticket, winning)))
        .collect();
    (ranked, aggregate_rankings(tickets, winning))
}

fn cmd_rank(
    tickets_path: &Path,
    winning: &[u8],
    bonus: Option<u8>,
    file: Option<&Path>,
    draw: Option<u32>,
    json: bool,
) -> Result<()> {
    let winning = resolve_winning(winning, bonus, file, draw)?;
    let tickets = load_tickets(tickets_path)?;

    let (ranked, tally) = rank_tickets(&tickets, &winning);

    if json {
        #[derive(Serialize)]
        struct RankedTicket {
            numbers: Combination,
            rank: u8,
        }
        #[derive(Serialize)]
        struct RankOutput<'a> {
            winning: &'a WinningNumbers,
            tickets: Vec<RankedTicket>,
            tally: &'a RankTally,
        }
        let tickets = ranked
            .iter()
            .map(|(numbers, rank)| RankedTicket {
                numbers: *numbers,
                rank: rank.as_u8(),
            })
            .collect();
        return print_json(&RankOutput {
            winning: &winning,
            tickets,
            tally: &tally,
        });
    }

    display_rankings(&ranked, &winning, &tally);
    Ok(())
}
