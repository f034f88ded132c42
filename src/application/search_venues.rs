use crate::application::interface::VenueRepositoryTrait;
use crate::entity::price::format_price;
use crate::entity::venue::{filter_venues, Venue, VenueQuery};

#[cfg(test)]
use crate::entity::venue::{SportType, Turf};
#[cfg(test)]
use crate::error::TurfslotError;
#[cfg(test)]
use chrono::{DateTime, Local};

pub fn search_venues<'a>(
    venue_repository: &'a dyn VenueRepositoryTrait,
    query: &VenueQuery,
) -> Vec<&'a Venue> {
    let venues = venue_repository.get_all_venues();
    let found = filter_venues(&venues, query);

    log::info!(
        "{} of {} venues match '{}' ({} filters)",
        found.len(),
        venues.len(),
        query.get_text(),
        query.active_filter_count()
    );
    found
}

pub fn describe_venue(venue: &Venue) -> String {
    let sports: Vec<String> = venue.sports().iter().map(|s| s.to_string()).collect();
    let price = match venue.price_range() {
        Some((lo, hi)) if lo == hi => format!("{}/hour", format_price(lo)),
        Some((lo, hi)) => format!("{}-{}/hour", format_price(lo), format_price(hi)),
        None => "no turfs".to_string(),
    };

    format!("{}\t{}\t{}", venue.get_name(), sports.join(","), price)
}

#[cfg(test)]
struct InMemoryVenueRepository {
    venues: Vec<Venue>,
}

#[cfg(test)]
impl VenueRepositoryTrait for InMemoryVenueRepository {
    fn load(&mut self) -> Result<(), TurfslotError> {
        Ok(())
    }

    fn get_all_venues(&self) -> Vec<&Venue> {
        self.venues.iter().collect()
    }

    fn get_turf(&self, turf_id: &str) -> Option<&Turf> {
        self.venues.iter().find_map(|venue| venue.get_turf(turf_id))
    }

    fn sync_clock(&mut self, _now: DateTime<Local>) {}

    fn get_last_synced_time(&self) -> DateTime<Local> {
        DateTime::<Local>::MIN_UTC.into()
    }
}

#[cfg(test)]
fn repository() -> InMemoryVenueRepository {
    InMemoryVenueRepository {
        venues: vec![
            Venue::new(
                "11",
                "Green Field Arena",
                "MG Road",
                "sup",
                vec![
                    Turf::new("15", "Main", "11", SportType::Football, 1000.0, vec![]),
                    Turf::new("17", "Nets", "11", SportType::Cricket, 1500.0, vec![]),
                ],
            ),
            Venue::new(
                "12",
                "Smash Court",
                "Indiranagar",
                "ace",
                vec![Turf::new("16", "Court 1", "12", SportType::Badminton, 400.0, vec![])],
            ),
        ],
    }
}

#[test]
fn test_search_venues_スポーツで絞り込む() {
    let repository = repository();
    let mut query = VenueQuery::default();
    query.toggle_sport(SportType::Badminton);

    let actual = search_venues(&repository, &query);

    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].get_name(), "Smash Court");
}

#[test]
fn test_describe_venue() {
    let repository = repository();
    let venues = repository.get_all_venues();

    assert_eq!(
        describe_venue(venues[0]),
        "Green Field Arena\tfootball,cricket\t₹1000-₹1500/hour"
    );
    assert_eq!(describe_venue(venues[1]), "Smash Court\tbadminton\t₹400/hour");
}
