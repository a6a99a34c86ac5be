#![allow(clippy::unwrap_used)]

use chrono::{Duration, NaiveTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tempfile::{tempdir, TempDir};
use uiu_study_bot::config::{MaintenanceSettings, MatchSettings};
use uiu_study_bot::database::{connection::DatabaseManager, models::*};
use uiu_study_bot::error::BotError;
use uiu_study_bot::services::fuzzy::FuzzyMatcher;
use uiu_study_bot::services::maintenance::run_sweep;
use uiu_study_bot::services::matching::{MatchQuery, MatchingEngine, RideQuery, RouteSource};
use uiu_study_bot::utils::datetime::to_db_timestamp;

async fn setup_test_db() -> (DatabaseManager, TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.to_string_lossy());

    let db = DatabaseManager::new(&db_url).await.unwrap();
    db.run_migrations().await.unwrap();
    (db, dir)
}

async fn add_profile(
    db: &DatabaseManager,
    user_id: i64,
    courses: &[(&str, Option<&str>)],
    ride_opt_in: bool,
) -> Profile {
    let draft = ProfileDraft {
        department: "CSE".to_string(),
        year: 3,
        courses: courses
            .iter()
            .map(|(code, section)| (code.to_string(), section.map(str::to_string)))
            .collect(),
        contacts: BTreeMap::from([("telegram".to_string(), format!("@student{user_id}"))]),
        ride_opt_in,
    };

    Profile::upsert(&db.pool, user_id, Some(format!("student{user_id}")), &draft)
        .await
        .unwrap()
}

async fn set_last_active(db: &DatabaseManager, user_id: i64, days_ago: i64) {
    sqlx::query("UPDATE profiles SET last_active = ? WHERE user_id = ?")
        .bind(to_db_timestamp(&(Utc::now() - Duration::days(days_ago))))
        .bind(user_id)
        .execute(&db.pool)
        .await
        .unwrap();
}

fn engine(db: &DatabaseManager) -> MatchingEngine {
    MatchingEngine::new(db.clone(), MatchSettings::default())
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

#[test]
fn test_equal_after_normalization_scores_100() {
    let matcher = FuzzyMatcher::default();
    assert_eq!(matcher.score("CSE 321", "  cse   321 ").unwrap(), 100);
    assert_eq!(matcher.score("Dhanmondi", "DHANMONDI").unwrap(), 100);
    assert!(matcher.score("CSE321", "CSE322").unwrap() < 100);
}

#[tokio::test]
async fn test_study_partners_never_include_requester() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", Some("A"))], false).await;
    add_profile(&db, 2, &[("CSE321", Some("A"))], false).await;
    add_profile(&db, 3, &[("CSE321", None)], false).await;

    let query = MatchQuery::new("cse321", None).unwrap();
    let partners = engine(&db).find_study_partners(1, &query).await.unwrap();

    let ids: Vec<i64> = partners.iter().map(|p| p.user_id).collect();
    assert!(!ids.contains(&1));
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn test_study_partners_rank_own_section_first() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", Some("B"))], false).await;
    add_profile(&db, 3, &[("CSE321", Some("A"))], false).await;
    add_profile(&db, 4, &[("CSE321", Some("B"))], false).await;
    add_profile(&db, 5, &[("MAT201", Some("B"))], false).await;

    let query = MatchQuery::new("cse 321", None).unwrap();
    let partners = engine(&db).find_study_partners(1, &query).await.unwrap();

    let ids: Vec<i64> = partners.iter().map(|p| p.user_id).collect();
    // Same section as the requester first, then other sections
    assert_eq!(ids, vec![4, 3]);
    assert_eq!(partners[0].section_score, 100);
    assert!(partners.iter().all(|p| p.course_code == "CSE321"));
}

#[tokio::test]
async fn test_neighbouring_course_codes_are_different_courses() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", Some("A"))], false).await;
    add_profile(&db, 2, &[("CSE321", Some("A"))], false).await;
    add_profile(&db, 3, &[("CSE322", Some("A"))], false).await;
    add_profile(&db, 4, &[("CSE331", Some("A"))], false).await;
    add_profile(&db, 5, &[("CSE321", Some("B"))], false).await;

    let engine = engine(&db);
    let partners = engine
        .find_study_partners(99, &MatchQuery::new("cse321", None).unwrap())
        .await
        .unwrap();
    let mut partner_ids: Vec<i64> = partners.iter().map(|p| p.user_id).collect();
    partner_ids.sort_unstable();
    assert_eq!(partner_ids, vec![1, 2, 5]);

    let peers = engine
        .find_section_peers(99, &MatchQuery::new("cse321", Some("A")).unwrap())
        .await
        .unwrap();
    let mut peer_ids: Vec<i64> = peers.iter().map(|p| p.user_id).collect();
    peer_ids.sort_unstable();
    assert_eq!(peer_ids, vec![1, 2]);

    // A lone student in CSE322 has nobody to study with
    let err = engine
        .find_study_partners(3, &MatchQuery::new("CSE322", None).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, BotError::NotFound(_)));
}

#[tokio::test]
async fn test_study_partners_one_entry_per_user() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 2, &[("CSE321", Some("A")), ("MAT201", Some("A"))], false).await;

    let query = MatchQuery::new("CSE321", None).unwrap();
    let partners = engine(&db).find_study_partners(1, &query).await.unwrap();

    assert_eq!(partners.len(), 1);
    assert_eq!(partners[0].course_code, "CSE321");
}

#[tokio::test]
async fn test_no_study_partners_is_not_found() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 2, &[("MAT201", None)], false).await;

    let query = MatchQuery::new("CSE321", None).unwrap();
    let err = engine(&db).find_study_partners(1, &query).await.unwrap_err();

    assert!(matches!(err, BotError::NotFound(_)));
}

#[test]
fn test_malformed_course_is_validation_error() {
    let err = MatchQuery::new("3@!", None).unwrap_err();
    assert!(matches!(err, BotError::Validation(_)));
}

#[tokio::test]
async fn test_section_match_picks_only_matching_section() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 10, &[("CSE321", Some("A"))], false).await;
    add_profile(&db, 11, &[("CSE321", Some("B"))], false).await;

    let query = MatchQuery::new("cse321", Some("A")).unwrap();
    let peers = engine(&db).find_section_peers(99, &query).await.unwrap();

    let ids: Vec<i64> = peers.iter().map(|p| p.user_id).collect();
    assert_eq!(ids, vec![10]);
}

#[tokio::test]
async fn test_section_peers_are_subset_of_study_partners() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", Some("A"))], false).await;
    add_profile(&db, 2, &[("CSE321", Some("A"))], false).await;
    add_profile(&db, 3, &[("CSE321", Some("B"))], false).await;
    add_profile(&db, 4, &[("CSE321", None)], false).await;
    add_profile(&db, 5, &[("CSE322", Some("A"))], false).await;
    add_profile(&db, 6, &[("EEE101", Some("A"))], false).await;

    let engine = engine(&db);
    let partners = engine
        .find_study_partners(1, &MatchQuery::new("CSE321", None).unwrap())
        .await
        .unwrap();
    let peers = engine
        .find_section_peers(1, &MatchQuery::new("CSE321", Some("A")).unwrap())
        .await
        .unwrap();

    let partner_ids: HashSet<i64> = partners.iter().map(|p| p.user_id).collect();
    assert!(!peers.is_empty());
    for peer in &peers {
        assert!(partner_ids.contains(&peer.user_id), "peer {} not a partner", peer.user_id);
    }
    assert!(!peers.iter().any(|p| p.user_id == 3 || p.user_id == 4));
}

#[tokio::test]
async fn test_section_peers_require_section() {
    let (db, _temp_dir) = setup_test_db().await;

    let query = MatchQuery::new("CSE321", None).unwrap();
    let err = engine(&db).find_section_peers(1, &query).await.unwrap_err();

    assert!(matches!(err, BotError::Validation(_)));
}

#[tokio::test]
async fn test_ride_matches_within_time_tolerance_only() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", None)], true).await;
    add_profile(&db, 2, &[("CSE321", None)], true).await;
    add_profile(&db, 3, &[("CSE321", None)], true).await;
    RideRequest::upsert(&db.pool, 2, "Dhanmondi", "UIU", "08:15").await.unwrap();
    RideRequest::upsert(&db.pool, 3, "Dhanmondi", "UIU", "10:00").await.unwrap();

    let query = RideQuery::new("Dhanmondi", "UIU", at(8, 0)).unwrap();
    let found = engine(&db).find_ride_matches(1, &query).await.unwrap();

    let ids: Vec<i64> = found.matches.iter().map(|m| m.user_id).collect();
    assert_eq!(ids, vec![2]);
    assert_eq!(found.matches[0].time_offset_minutes, 15);
    assert_eq!(found.request.user_id, 1);
    assert!(found.notifications.is_none());
}

#[tokio::test]
async fn test_ride_matches_skip_users_not_opted_in() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", None)], true).await;
    add_profile(&db, 2, &[("CSE321", None)], false).await;
    RideRequest::upsert(&db.pool, 2, "Dhanmondi", "UIU", "08:00").await.unwrap();

    let query = RideQuery::new("Dhanmondi", "UIU", at(8, 0)).unwrap();
    let err = engine(&db).find_ride_matches(1, &query).await.unwrap_err();

    assert!(matches!(err, BotError::NotFound(_)));
    // The request is kept for later riders
    assert_eq!(RideRequest::count_by_user(&db.pool, 1).await.unwrap(), 1);
}

#[tokio::test]
async fn test_ride_matches_use_stored_commutes() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", None)], true).await;
    add_profile(&db, 2, &[("CSE321", None)], true).await;
    let commute = Commute {
        from_location: "Mirpur 10".to_string(),
        to_location: "UIU".to_string(),
        time: "23:50".to_string(),
    };
    assert!(Profile::set_commute(&db.pool, 2, &commute).await.unwrap());

    // 20 minutes apart across midnight
    let query = RideQuery::new("mirpur  10", "uiu", at(0, 10)).unwrap();
    let found = engine(&db).find_ride_matches(1, &query).await.unwrap();

    assert_eq!(found.matches.len(), 1);
    assert_eq!(found.matches[0].source, RouteSource::Commute);
    assert_eq!(found.matches[0].time_offset_minutes, 20);
}

#[tokio::test]
async fn test_ride_matches_rank_closer_routes_first() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", None)], true).await;
    add_profile(&db, 2, &[("CSE321", None)], true).await;
    add_profile(&db, 3, &[("CSE321", None)], true).await;
    RideRequest::upsert(&db.pool, 2, "Dhanmondi", "UIU", "08:25").await.unwrap();
    RideRequest::upsert(&db.pool, 3, "Dhanmondi", "UIU", "08:05").await.unwrap();

    let query = RideQuery::new("Dhanmondi", "UIU", at(8, 0)).unwrap();
    let found = engine(&db).find_ride_matches(1, &query).await.unwrap();

    let ids: Vec<i64> = found.matches.iter().map(|m| m.user_id).collect();
    assert_eq!(ids, vec![3, 2]);
    assert!(found.matches[0].score > found.matches[1].score);
}

#[tokio::test]
async fn test_repeated_ride_request_is_stored_once() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", None)], true).await;
    add_profile(&db, 2, &[("CSE321", None)], true).await;
    RideRequest::upsert(&db.pool, 2, "Dhanmondi", "UIU", "08:10").await.unwrap();

    let engine = engine(&db);
    let query = RideQuery::new("Dhanmondi", "UIU", at(8, 0)).unwrap();
    let first = engine.find_ride_matches(1, &query).await.unwrap();
    let second = engine.find_ride_matches(1, &query).await.unwrap();

    assert_eq!(RideRequest::count_by_user(&db.pool, 1).await.unwrap(), 1);
    assert_eq!(first.request.id, second.request.id);
    assert!(second.request.created_at >= first.request.created_at);

    // A different departure time is a new request
    let later = RideQuery::new("Dhanmondi", "UIU", at(8, 20)).unwrap();
    let third = engine.find_ride_matches(1, &later).await.unwrap();
    assert_ne!(third.request.id, second.request.id);
    assert_eq!(RideRequest::count_by_user(&db.pool, 1).await.unwrap(), 1);
    assert_eq!(engine.active_ride(1).await.unwrap().unwrap().id, third.request.id);
}

#[tokio::test]
async fn test_ride_requires_requester_profile() {
    let (db, _temp_dir) = setup_test_db().await;

    let query = RideQuery::new("Dhanmondi", "UIU", at(8, 0)).unwrap();
    let err = engine(&db).find_ride_matches(1, &query).await.unwrap_err();

    assert!(matches!(err, BotError::NotFound(_)));
    assert_eq!(RideRequest::count_by_user(&db.pool, 1).await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancel_ride() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", None)], true).await;
    RideRequest::upsert(&db.pool, 1, "Dhanmondi", "UIU", "08:00").await.unwrap();

    let engine = engine(&db);
    assert!(engine.cancel_ride(1).await.unwrap());
    assert!(!engine.cancel_ride(1).await.unwrap());
    assert!(engine.active_ride(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_swept_profiles_disappear_from_results() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", Some("A"))], true).await;
    add_profile(&db, 2, &[("CSE321", Some("A"))], true).await;
    add_profile(&db, 3, &[("CSE321", Some("A"))], true).await;
    RideRequest::upsert(&db.pool, 2, "Dhanmondi", "UIU", "08:00").await.unwrap();
    RideRequest::upsert(&db.pool, 3, "Dhanmondi", "UIU", "08:00").await.unwrap();
    set_last_active(&db, 2, 151).await;
    set_last_active(&db, 3, 30).await;

    let report = run_sweep(&db, &MaintenanceSettings::default(), Utc::now()).await.unwrap();
    assert_eq!(report.expired_profiles, 1);

    let engine = engine(&db);
    let partners = engine
        .find_study_partners(1, &MatchQuery::new("CSE321", None).unwrap())
        .await
        .unwrap();
    let peers = engine
        .find_section_peers(1, &MatchQuery::new("CSE321", Some("A")).unwrap())
        .await
        .unwrap();
    let rides = engine
        .find_ride_matches(1, &RideQuery::new("Dhanmondi", "UIU", at(8, 0)).unwrap())
        .await
        .unwrap();

    assert!(partners.iter().all(|p| p.user_id != 2));
    assert!(peers.iter().all(|p| p.user_id != 2));
    assert!(rides.matches.iter().all(|m| m.user_id != 2));
    assert!(Profile::find(&db.pool, 2).await.unwrap().is_none());
    assert_eq!(RideRequest::count_by_user(&db.pool, 2).await.unwrap(), 0);

    // Nothing left to expire
    let again = run_sweep(&db, &MaintenanceSettings::default(), Utc::now()).await.unwrap();
    assert_eq!(again.expired_profiles, 0);
}

#[tokio::test]
async fn test_sweep_expires_stale_ride_requests() {
    let (db, _temp_dir) = setup_test_db().await;
    add_profile(&db, 1, &[("CSE321", None)], true).await;
    RideRequest::upsert(&db.pool, 1, "Dhanmondi", "UIU", "08:00").await.unwrap();

    let report = run_sweep(&db, &MaintenanceSettings::default(), Utc::now() + Duration::hours(25))
        .await
        .unwrap();

    assert_eq!(report.expired_ride_requests, 1);
    assert_eq!(RideRequest::count_by_user(&db.pool, 1).await.unwrap(), 0);
}
