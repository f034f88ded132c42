use crate::entity::booking::Booking;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SportType {
    Football,
    Cricket,
    Basketball,
    Tennis,
    Badminton,
    Volleyball,
    Rugby,
    Hockey,
}

impl SportType {
    pub fn all() -> [SportType; 8] {
        [
            SportType::Football,
            SportType::Cricket,
            SportType::Basketball,
            SportType::Tennis,
            SportType::Badminton,
            SportType::Volleyball,
            SportType::Rugby,
            SportType::Hockey,
        ]
    }
}

impl fmt::Display for SportType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            SportType::Football => "football",
            SportType::Cricket => "cricket",
            SportType::Basketball => "basketball",
            SportType::Tennis => "tennis",
            SportType::Badminton => "badminton",
            SportType::Volleyball => "volleyball",
            SportType::Rugby => "rugby",
            SportType::Hockey => "hockey",
        };
        write!(f, "{}", s)
    }
}

pub fn read_sport_type(s: &str) -> Option<SportType> {
    let lc = s.trim().to_lowercase();

    SportType::all()
        .into_iter()
        .find(|sport| sport.to_string() == lc)
}

#[test]
fn test_read_sport_type() {
    assert_eq!(read_sport_type("Cricket"), Some(SportType::Cricket));
    assert_eq!(read_sport_type(" hockey "), Some(SportType::Hockey));
    assert_eq!(read_sport_type("chess"), None);
}

#[derive(Clone, Debug, PartialEq)]
pub struct Turf {
    id: String,
    name: String,
    venue_id: String,
    sport: SportType,
    price_per_hour: f64,
    bookings: Vec<Booking>,
}

impl Turf {
    pub fn new(
        id: &str,
        name: &str,
        venue_id: &str,
        sport: SportType,
        price_per_hour: f64,
        bookings: Vec<Booking>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            venue_id: venue_id.to_string(),
            sport,
            price_per_hour,
            bookings,
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_venue_id(&self) -> &str {
        &self.venue_id
    }

    pub fn get_sport(&self) -> SportType {
        self.sport
    }

    pub fn get_price_per_hour(&self) -> f64 {
        self.price_per_hour
    }

    pub fn get_bookings(&self) -> &Vec<Booking> {
        &self.bookings
    }

    pub fn add_booking(&mut self, booking: Booking) {
        self.bookings.push(booking);
    }

    // キャンセル済みと不正な区間を除いた予約
    pub fn active_bookings(&self) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|booking| booking.blocks_slots() && booking.is_well_formed())
            .cloned()
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Venue {
    id: String,
    name: String,
    address: String,
    host_name: String,
    turfs: Vec<Turf>,
}

impl Venue {
    pub fn new(id: &str, name: &str, address: &str, host_name: &str, turfs: Vec<Turf>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            host_name: host_name.to_string(),
            turfs,
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_address(&self) -> &str {
        &self.address
    }

    pub fn get_host_name(&self) -> &str {
        &self.host_name
    }

    pub fn get_turfs(&self) -> &Vec<Turf> {
        &self.turfs
    }

    pub fn get_turf(&self, turf_id: &str) -> Option<&Turf> {
        self.turfs.iter().find(|turf| turf.get_id() == turf_id)
    }

    // turf_idで振り分け、該当するターフがない予約は返す
    pub fn attach_bookings(&mut self, bookings: Vec<Booking>) -> Vec<Booking> {
        let mut orphans = vec![];

        for booking in bookings {
            match self
                .turfs
                .iter_mut()
                .find(|turf| turf.get_id() == booking.get_turf_id())
            {
                Some(turf) => turf.add_booking(booking),
                None => orphans.push(booking),
            }
        }

        orphans
    }

    // 重複を除き、ターフの並び順で返す
    pub fn sports(&self) -> Vec<SportType> {
        let mut sports: Vec<SportType> = vec![];
        for turf in self.turfs.iter() {
            if !sports.contains(&turf.get_sport()) {
                sports.push(turf.get_sport());
            }
        }
        sports
    }

    pub fn price_range(&self) -> Option<(f64, f64)> {
        let prices = self.turfs.iter().map(|turf| turf.get_price_per_hour());

        prices.fold(None, |acc, price| match acc {
            None => Some((price, price)),
            Some((lo, hi)) => Some((lo.min(price), hi.max(price))),
        })
    }
}

pub const PRICE_FLOOR: f64 = 0.0;
pub const PRICE_CEILING: f64 = 3000.0;

#[derive(Clone, Debug, PartialEq)]
pub struct VenueQuery {
    text: String,
    sports: Vec<SportType>,
    min_price: f64,
    max_price: f64,
}

impl VenueQuery {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sports: vec![],
            min_price: PRICE_FLOOR,
            max_price: PRICE_CEILING,
        }
    }

    pub fn get_text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn get_sports(&self) -> &Vec<SportType> {
        &self.sports
    }

    pub fn get_price_range(&self) -> (f64, f64) {
        (self.min_price, self.max_price)
    }

    pub fn set_price_range(&mut self, min_price: f64, max_price: f64) {
        let (lo, hi) = if min_price <= max_price {
            (min_price, max_price)
        } else {
            (max_price, min_price)
        };
        self.min_price = lo.max(PRICE_FLOOR);
        self.max_price = hi.min(PRICE_CEILING);
    }

    pub fn toggle_sport(&mut self, sport: SportType) {
        if self.sports.contains(&sport) {
            self.sports.retain(|s| *s != sport);
        } else {
            self.sports.push(sport);
        }
    }

    pub fn is_price_filter_active(&self) -> bool {
        self.min_price > PRICE_FLOOR || self.max_price < PRICE_CEILING
    }

    pub fn active_filter_count(&self) -> usize {
        let mut count = 0;
        if !self.sports.is_empty() {
            count += 1;
        }
        if self.is_price_filter_active() {
            count += 1;
        }
        count
    }

    pub fn clear_filters(&mut self) {
        self.sports.clear();
        self.min_price = PRICE_FLOOR;
        self.max_price = PRICE_CEILING;
    }

    pub fn matches(&self, venue: &Venue) -> bool {
        let text = self.text.trim().to_lowercase();
        if !text.is_empty()
            && !venue.get_name().to_lowercase().contains(&text)
            && !venue.get_address().to_lowercase().contains(&text)
        {
            return false;
        }

        if !self.sports.is_empty()
            && !venue
                .get_turfs()
                .iter()
                .any(|turf| self.sports.contains(&turf.get_sport()))
        {
            return false;
        }

        if self.is_price_filter_active()
            && !venue.get_turfs().iter().any(|turf| {
                let price = turf.get_price_per_hour();
                self.min_price <= price && price <= self.max_price
            })
        {
            return false;
        }

        true
    }
}

impl Default for VenueQuery {
    fn default() -> Self {
        Self::new("")
    }
}

pub fn filter_venues<'a>(venues: &[&'a Venue], query: &VenueQuery) -> Vec<&'a Venue> {
    venues
        .iter()
        .filter(|venue| query.matches(venue))
        .copied()
        .collect()
}

#[cfg(test)]
fn sample_venues() -> Vec<Venue> {
    vec![
        Venue::new(
            "11",
            "Green Field Arena",
            "MG Road, Bengaluru",
            "sup",
            vec![
                Turf::new("15", "Main Ground", "11", SportType::Football, 1000.0, vec![]),
                Turf::new("17", "Box Cricket", "11", SportType::Cricket, 1500.0, vec![]),
            ],
        ),
        Venue::new(
            "12",
            "Smash Court",
            "Indiranagar",
            "ace",
            vec![Turf::new("16", "Court 1", "12", SportType::Badminton, 400.0, vec![])],
        ),
        Venue::new("13", "Empty Lot", "Whitefield", "nobody", vec![]),
    ]
}

#[test]
fn test_filter_venues_条件なしは全件() {
    let venues = sample_venues();
    let refs: Vec<&Venue> = venues.iter().collect();

    let actual = filter_venues(&refs, &VenueQuery::default());

    assert_eq!(actual.len(), 3);
}

#[test]
fn test_filter_venues_名前と住所を大文字小文字を区別せず検索() {
    let venues = sample_venues();
    let refs: Vec<&Venue> = venues.iter().collect();

    let by_name = filter_venues(&refs, &VenueQuery::new("smash"));
    let by_address = filter_venues(&refs, &VenueQuery::new("BENGALURU"));

    assert_eq!(by_name[0].get_id(), "12");
    assert_eq!(by_address[0].get_id(), "11");
}

#[test]
fn test_filter_venues_いずれかのターフがスポーツに一致() {
    let venues = sample_venues();
    let refs: Vec<&Venue> = venues.iter().collect();
    let mut query = VenueQuery::default();
    query.toggle_sport(SportType::Cricket);

    let actual = filter_venues(&refs, &query);

    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].get_id(), "11");
}

#[test]
fn test_filter_venues_価格帯() {
    let venues = sample_venues();
    let refs: Vec<&Venue> = venues.iter().collect();
    let mut query = VenueQuery::default();
    query.set_price_range(0.0, 500.0);

    let actual = filter_venues(&refs, &query);

    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].get_id(), "12");
}

#[test]
fn test_venue_query_active_filter_count() {
    let mut query = VenueQuery::new("arena");
    assert_eq!(query.active_filter_count(), 0);

    query.toggle_sport(SportType::Football);
    query.set_price_range(100.0, 3000.0);
    assert_eq!(query.active_filter_count(), 2);

    query.toggle_sport(SportType::Football);
    assert_eq!(query.active_filter_count(), 1);

    query.clear_filters();
    assert_eq!(query.active_filter_count(), 0);
}

#[test]
fn test_attach_bookings_ターフごとに振り分ける() {
    use crate::entity::booking::BookingStatus;
    use chrono::{Local, TimeZone};

    let mut venue = sample_venues().remove(0);
    let start = Local.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
    let end = Local.with_ymd_and_hms(2024, 5, 10, 10, 0, 0).unwrap();
    let for_cricket = Booking::new("1", "17", "a", start, end, 1500.0, BookingStatus::Confirmed);
    let elsewhere = Booking::new("2", "99", "b", start, end, 0.0, BookingStatus::Confirmed);

    let orphans = venue.attach_bookings(vec![for_cricket, elsewhere]);

    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].get_id(), "2");
    assert_eq!(venue.get_turf("17").unwrap().get_bookings().len(), 1);
    assert!(venue.get_turf("15").unwrap().get_bookings().is_empty());
}

#[test]
fn test_venue_sports_重複を除く() {
    let venue = Venue::new(
        "1",
        "v",
        "a",
        "h",
        vec![
            Turf::new("1", "a", "1", SportType::Tennis, 300.0, vec![]),
            Turf::new("2", "b", "1", SportType::Football, 900.0, vec![]),
            Turf::new("3", "c", "1", SportType::Tennis, 350.0, vec![]),
        ],
    );

    assert_eq!(venue.sports(), vec![SportType::Tennis, SportType::Football]);
    assert_eq!(venue.price_range(), Some((300.0, 900.0)));
}
