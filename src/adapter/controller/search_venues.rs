use chrono::Local;
use regex::Regex;
use std::env;
use std::process;
use turfslot::adapter::controller::terminal::pad_to_width;
use turfslot::adapter::gateway::venue_repository::VenueRepository;
use turfslot::application::interface::VenueRepositoryTrait;
use turfslot::application::search_venues::{describe_venue, search_venues};
use turfslot::entity::venue::{read_sport_type, VenueQuery};
use turfslot::error::TurfslotError;

const NAME_WIDTH: usize = 28;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "usage: {} <venues_dir> [query] [--sport <sport>]... [--price <min>-<max>]",
            &args[0]
        );
        process::exit(2);
    }

    let result = parse_query(&args[2..]).and_then(|query| run(&args[1], &query));
    if let Err(e) = result {
        eprintln!("search_venues: {}", e);
        process::exit(1);
    }
}

fn parse_query(args: &[String]) -> Result<VenueQuery, TurfslotError> {
    let price_pattern = Regex::new(r"^(\d+)-(\d+)$")
        .map_err(|e| TurfslotError::InvalidArgument(e.to_string()))?;

    let mut text: Vec<&str> = vec![];
    let mut query = VenueQuery::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--sport" => {
                let value = iter.next().map(|s| s.as_str()).unwrap_or("");
                let sport = read_sport_type(value).ok_or_else(|| {
                    TurfslotError::InvalidArgument(format!("unknown sport '{}'", value))
                })?;
                query.toggle_sport(sport);
            }
            "--price" => {
                let value = iter.next().map(|s| s.as_str()).unwrap_or("");
                let caps = price_pattern.captures(value).ok_or_else(|| {
                    TurfslotError::InvalidArgument(format!("price range '{}'", value))
                })?;
                let min: f64 = caps[1].parse().unwrap_or(0.0);
                let max: f64 = caps[2].parse().unwrap_or(0.0);
                query.set_price_range(min, max);
            }
            word => text.push(word),
        }
    }

    query.set_text(&text.join(" "));
    Ok(query)
}

fn run(venues_dir: &str, query: &VenueQuery) -> Result<(), TurfslotError> {
    let mut venue_repository = VenueRepository::new(venues_dir);
    venue_repository.sync_clock(Local::now());
    venue_repository.load()?;

    let found = search_venues(&venue_repository, query);
    println!("{} venues found", found.len());

    for venue in found {
        let line = describe_venue(venue);
        let mut cols = line.splitn(2, '\t');
        let name = cols.next().unwrap_or("");
        let rest = cols.next().unwrap_or("");
        println!("{} {}", pad_to_width(name, NAME_WIDTH), rest.replace('\t', "  "));
    }

    Ok(())
}

#[cfg(test)]
fn args_of(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn test_parse_query_不明なスポーツは引数エラー() {
    let actual = parse_query(&args_of(&["--sport", "curling"]));

    assert!(matches!(actual, Err(TurfslotError::InvalidArgument(_))));
}

#[test]
fn test_parse_query_価格帯の書式違いは引数エラー() {
    let actual = parse_query(&args_of(&["--price", "500"]));

    assert!(matches!(actual, Err(TurfslotError::InvalidArgument(_))));
}

#[test]
fn test_parse_query_検索語と価格帯() {
    let query = parse_query(&args_of(&["green", "field", "--price", "500-1500"])).unwrap();

    assert_eq!(query.get_text(), "green field");
    assert_eq!(query.get_price_range(), (500.0, 1500.0));
}
