use crate::adapter::gateway::backend_json::parse_bookings;
use crate::adapter::gateway::yaml::yaml_to_venue;
use crate::application::interface::VenueRepositoryTrait;
use crate::entity::venue::{Turf, Venue};
use crate::error::TurfslotError;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use walkdir::WalkDir;
use yaml_rust::YamlLoader;

pub const VENUE_FILE_NAME: &str = "venue.yaml";
pub const BOOKINGS_FILE_NAME: &str = "bookings.json";

// venue_storage_dir以下の venue.yaml を全て読む
// 同じディレクトリに bookings.json (バックエンドの予約一覧) があれば各ターフに取り込む
pub struct VenueRepository {
    venues: Vec<Venue>,
    venue_storage_dir_name: String,
    last_synced_time: DateTime<Local>,
}

impl VenueRepository {
    pub fn new(venue_storage_dir_name: &str) -> Self {
        Self {
            venues: vec![],
            venue_storage_dir_name: venue_storage_dir_name.to_string(),
            last_synced_time: DateTime::<Local>::MIN_UTC.into(),
        }
    }

    pub fn get_venue_storage_dir_name(&self) -> &str {
        &self.venue_storage_dir_name
    }

    fn load_venue_from_str(text: &str) -> Result<Vec<Venue>, TurfslotError> {
        let docs = YamlLoader::load_from_str(text)?;

        Ok(docs
            .iter()
            .filter(|doc| !doc["venue"].is_badvalue())
            .map(|doc| yaml_to_venue(&doc["venue"]))
            .collect())
    }

    fn attach_backend_bookings(
        venues: &mut [Venue],
        bookings_path: &Path,
    ) -> Result<(), TurfslotError> {
        let mut file = File::open(bookings_path)?;
        let mut text = String::new();
        file.read_to_string(&mut text)?;

        let mut bookings = parse_bookings(&text)?;
        for venue in venues.iter_mut() {
            bookings = venue.attach_bookings(bookings);
        }

        if !bookings.is_empty() {
            log::warn!(
                "{} bookings in {:?} belong to no known turf",
                bookings.len(),
                bookings_path
            );
        }
        Ok(())
    }
}

impl VenueRepositoryTrait for VenueRepository {
    fn load(&mut self) -> Result<(), TurfslotError> {
        self.venues.clear();

        for entry in WalkDir::new(self.venue_storage_dir_name.as_str())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_name() != VENUE_FILE_NAME {
                continue;
            }

            let mut file = File::open(entry.path())?;
            let mut text = String::new();
            file.read_to_string(&mut text)?;

            match Self::load_venue_from_str(&text) {
                Ok(mut venues) => {
                    let bookings_path = entry.path().with_file_name(BOOKINGS_FILE_NAME);
                    if bookings_path.exists() {
                        if let Err(e) = Self::attach_backend_bookings(&mut venues, &bookings_path) {
                            log::warn!("ignoring {:?}: {}", bookings_path, e);
                        }
                    }
                    self.venues.append(&mut venues);
                }
                Err(e) => {
                    log::warn!("skipping {:?}: {}", entry.path(), e);
                }
            }
        }

        log::info!(
            "loaded {} venues from {}",
            self.venues.len(),
            self.venue_storage_dir_name
        );
        Ok(())
    }

    fn get_all_venues(&self) -> Vec<&Venue> {
        self.venues.iter().collect()
    }

    fn get_turf(&self, turf_id: &str) -> Option<&Turf> {
        self.venues
            .iter()
            .find_map(|venue| venue.get_turf(turf_id))
    }

    fn sync_clock(&mut self, now: DateTime<Local>) {
        self.last_synced_time = now;
    }

    fn get_last_synced_time(&self) -> DateTime<Local> {
        self.last_synced_time
    }
}

#[cfg(test)]
use std::fs;

#[cfg(test)]
fn temp_storage_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("turfslot-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_load_サブディレクトリのvenue_yamlを読む() {
    let dir = temp_storage_dir("load");
    let venue_dir = dir.join("12-green-field");
    fs::create_dir_all(&venue_dir).unwrap();
    fs::write(
        venue_dir.join(VENUE_FILE_NAME),
        "
venue:
  id: 12
  name: 'Green Field'
  turfs:
    - id: 16
      name: 'Main Ground'
      sport: 'football'
      price_per_hr: 1000
",
    )
    .unwrap();
    fs::write(dir.join("notes.yaml"), "venue:\n  id: 99\n").unwrap();

    fs::write(
        venue_dir.join(BOOKINGS_FILE_NAME),
        r#"[{"id": 7, "turf": {"id": 16}, "start_datetime": "2024-05-10T09:00:00", "end_datetime": "2024-05-10T11:00:00"}]"#,
    )
    .unwrap();

    let mut repository = VenueRepository::new(dir.to_str().unwrap());
    repository.load().unwrap();

    assert_eq!(repository.get_all_venues().len(), 1);
    assert_eq!(repository.get_turf("16").unwrap().get_bookings().len(), 1);
    let turf = repository.get_turf("16").unwrap();
    assert_eq!(turf.get_name(), "Main Ground");
    assert!(repository.get_turf("99").is_none());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_load_壊れたyamlは読み飛ばす() {
    let dir = temp_storage_dir("broken");
    fs::write(dir.join(VENUE_FILE_NAME), "venue: [").unwrap();

    let mut repository = VenueRepository::new(dir.to_str().unwrap());
    repository.load().unwrap();

    assert!(repository.get_all_venues().is_empty());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_sync_clock() {
    let mut repository = VenueRepository::new("/nonexistent");
    let now = Local::now();

    repository.sync_clock(now);

    assert_eq!(repository.get_last_synced_time(), now);
}
