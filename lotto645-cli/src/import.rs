use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use tracing::{debug, warn};

use lotto645_core::models::{Combination, Draw, PICK_COUNT};

/// Détecte le séparateur à partir de la ligne d'en-tête.
fn detect_delimiter(header: &str) -> u8 {
    if header.matches(';').count() >= header.matches(',').count() && header.contains(';') {
        b';'
    } else {
        b','
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let raw_no = get(0)?;
    let draw_no = raw_no
        .parse::<u32>()
        .with_context(|| format!("Numéro de tirage invalide: '{}'", raw_no))?;
    let date = parse_date(get(1)?)?;

    let mut numbers = [0u8; PICK_COUNT];
    for (i, slot) in numbers.iter_mut().enumerate() {
        *slot = get_u8(2 + i)?;
    }
    let bonus = get_u8(2 + PICK_COUNT)?;

    Ok(Draw::new(draw_no, date, numbers, bonus)?)
}

#[derive(Debug, Default)]
pub struct ImportResult {
    /// Tirages retenus, du plus récent au plus ancien.
    pub draws: Vec<Draw>,
    pub total_records: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn load_draws(path: &Path) -> Result<ImportResult> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let header = content.lines().next().unwrap_or_default();
    let delimiter = detect_delimiter(header);
    debug!("Lecture de {:?} (séparateur '{}')", path, delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut result = ImportResult::default();
    let mut seen = HashSet::new();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records + 1;
        match record_result.map_err(anyhow::Error::from).and_then(|r| parse_record(&r)) {
            Ok(draw) => {
                if seen.insert(draw.draw_no) {
                    result.draws.push(draw);
                } else {
                    debug!("Tirage {} en double ligne {}, ignoré", draw.draw_no, line);
                    result.skipped += 1;
                }
            }
            Err(e) => {
                warn!("Ligne {} ignorée : {:#}", line, e);
                result.errors += 1;
            }
        }
    }

    result.draws.sort_by(|a, b| b.draw_no.cmp(&a.draw_no));
    Ok(result)
}

/// Une combinaison par ligne, numéros séparés par des espaces ou des virgules.
pub fn parse_tickets(content: &str) -> Result<Vec<Combination>> {
    let mut tickets = Vec::new();
    for (i, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let numbers = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Ligne {} : numéros illisibles", i + 1))?;
        let combination = Combination::new(&numbers)
            .with_context(|| format!("Ligne {} : combinaison invalide", i + 1))?;
        tickets.push(combination);
    }
    if tickets.is_empty() {
        bail!("Aucune combinaison trouvée");
    }
    Ok(tickets)
}

pub fn load_tickets(path: &Path) -> Result<Vec<Combination>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    parse_tickets(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-06").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(parse_date("17/02/2026").unwrap(), NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
        assert!(parse_date("2026/02/17").is_err());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("draw_no;date;n1;n2;n3;n4;n5;n6;bonus"), b';');
        assert_eq!(detect_delimiter("draw_no,date,n1,n2,n3,n4,n5,n6,bonus"), b',');
    }

    #[test]
    fn test_load_semicolon_file() {
        let file = write_csv(
            "draw_no;date;n1;n2;n3;n4;n5;n6;bonus\n\
             1;07/12/2002;10;23;29;33;37;40;16\n\
             2;14/12/2002;9;13;21;25;32;42;2\n",
        );
        let result = load_draws(file.path()).unwrap();
        assert_eq!(result.total_records, 2);
        assert_eq!(result.errors, 0);
        assert_eq!(result.draws.len(), 2);
        assert_eq!(result.draws[0].draw_no, 2);
        assert_eq!(result.draws[1].numbers, [10, 23, 29, 33, 37, 40]);
    }

    #[test]
    fn test_load_sorts_numbers_and_skips_duplicates() {
        let file = write_csv(
            "draw_no,date,n1,n2,n3,n4,n5,n6,bonus\n\
             5,2024-01-06,40,3,17,8,22,31,12\n\
             5,2024-01-13,1,2,3,4,5,6,7\n",
        );
        let result = load_draws(file.path()).unwrap();
        assert_eq!(result.draws.len(), 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.draws[0].numbers, [3, 8, 17, 22, 31, 40]);
    }

    #[test]
    fn test_bad_rows_are_counted() {
        let file = write_csv(
            "draw_no;date;n1;n2;n3;n4;n5;n6;bonus\n\
             1;2024-01-06;1;2;3;4;5;6;7\n\
             2;2024-01-13;1;1;3;4;5;6;7\n\
             3;2024-01-20;1;2;3;4;5;46;7\n\
             4;pas une date;1;2;3;4;5;6;7\n\
             5;2024-01-27;1;2;3\n",
        );
        let result = load_draws(file.path()).unwrap();
        assert_eq!(result.total_records, 5);
        assert_eq!(result.errors, 4);
        assert_eq!(result.draws.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(load_draws(Path::new("/nonexistent/draws.csv")).is_err());
    }

    #[test]
    fn test_parse_tickets() {
        let tickets = parse_tickets(
            "# mes grilles\n\
             1 2 3 4 5 6\n\
             \n\
             45,44,43,42,41,40  # inversée\n",
        )
        .unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[1].numbers(), &[40, 41, 42, 43, 44, 45]);
    }

    #[test]
    fn test_parse_tickets_rejects_invalid_line() {
        assert!(parse_tickets("1 2 3 4 5\n").is_err());
        assert!(parse_tickets("1 2 3 4 5 x\n").is_err());
        assert!(parse_tickets("# rien\n").is_err());
    }
}
