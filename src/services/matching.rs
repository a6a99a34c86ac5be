use chrono::NaiveTime;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::MatchSettings;
use crate::database::{connection::DatabaseManager, models::*};
use crate::error::{with_timeout, BotError, BotResult};
use crate::services::fuzzy::{normalize, FuzzyMatcher};
use crate::services::notification::{DispatchReport, NotificationDispatcher};
use crate::utils::datetime::{clock_distance_minutes, format_clock_time, parse_clock_time};
use crate::utils::validation::{validate_course_code, validate_location, validate_section};

const FROM_WEIGHT: f64 = 0.35;
const TO_WEIGHT: f64 = 0.35;
const TIME_WEIGHT: f64 = 0.30;

/// Course (and optionally section) to look peers up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    pub course: String,
    pub section: Option<String>,
}

impl MatchQuery {
    pub fn new(course: &str, section: Option<&str>) -> BotResult<Self> {
        Ok(Self {
            course: validate_course_code(course)?,
            section: section.map(validate_section).transpose()?,
        })
    }
}

/// Route and departure time a user wants to share a ride for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RideQuery {
    pub from: String,
    pub to: String,
    pub time: NaiveTime,
}

impl RideQuery {
    pub fn new(from: &str, to: &str, time: NaiveTime) -> BotResult<Self> {
        Ok(Self {
            from: validate_location(from)?,
            to: validate_location(to)?,
            time,
        })
    }
}

/// A study partner candidate with the scores it was ranked by.
#[derive(Debug, Clone)]
pub struct StudyMatch {
    pub user_id: i64,
    pub display_name: String,
    pub department: String,
    pub year: i64,
    pub contacts: BTreeMap<String, String>,
    pub course_code: String,
    pub section: Option<String>,
    /// Proximity to the requester's own section in this course, 0 when unknown.
    pub section_score: u8,
    pub last_active: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Request,
    Commute,
}

/// An opted-in user whose route overlaps the queried one.
#[derive(Debug, Clone)]
pub struct RideMatch {
    pub user_id: i64,
    pub display_name: String,
    pub department: String,
    pub contacts: BTreeMap<String, String>,
    pub from_location: String,
    pub to_location: String,
    pub ride_time: String,
    pub source: RouteSource,
    pub from_score: u8,
    pub to_score: u8,
    pub time_offset_minutes: i64,
    pub score: f64,
    pub last_active: String,
}

/// Outcome of a ride search. The caller's request is already stored.
#[derive(Debug)]
pub struct RideMatches {
    pub request: RideRequest,
    pub matches: Vec<RideMatch>,
    /// Background notification run, when a dispatcher is configured.
    pub notifications: Option<JoinHandle<DispatchReport>>,
}

/// Finds study partners, section peers and ride partners in the profile store.
pub struct MatchingEngine {
    db: DatabaseManager,
    settings: MatchSettings,
    section_matcher: FuzzyMatcher,
    location_matcher: FuzzyMatcher,
    dispatcher: Option<Arc<NotificationDispatcher>>,
}

impl MatchingEngine {
    pub fn new(db: DatabaseManager, settings: MatchSettings) -> Self {
        Self {
            db,
            section_matcher: FuzzyMatcher::new(settings.section_threshold),
            location_matcher: FuzzyMatcher::new(settings.location_threshold),
            settings,
            dispatcher: None,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<NotificationDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Profiles enrolled in `query.course` (case-insensitive), never
    /// including the requester.
    ///
    /// Ranked by closeness to the requester's own section in that course,
    /// then by most recent activity.
    pub async fn find_study_partners(
        &self,
        requester_id: i64,
        query: &MatchQuery,
    ) -> BotResult<Vec<StudyMatch>> {
        let partners = self.course_candidates(requester_id, &query.course).await?;

        if partners.is_empty() {
            return Err(BotError::not_found(format!(
                "No study partners found for {}.",
                query.course
            )));
        }

        tracing::debug!("Found {} study partners for {}", partners.len(), query.course);
        Ok(partners)
    }

    /// Study partners whose section also matches, under the stricter
    /// section threshold.
    pub async fn find_section_peers(
        &self,
        requester_id: i64,
        query: &MatchQuery,
    ) -> BotResult<Vec<StudyMatch>> {
        let section = query
            .section
            .as_deref()
            .ok_or_else(|| BotError::validation("A section is required to find section peers."))?;

        let mut peers = Vec::new();
        for candidate in self.course_candidates(requester_id, &query.course).await? {
            let Some(candidate_section) = candidate.section.as_deref() else {
                continue;
            };
            if let Some(score) = self.section_matcher.matching_score(section, candidate_section)? {
                peers.push((score, candidate));
            }
        }

        if peers.is_empty() {
            return Err(BotError::not_found(format!(
                "No peers found in {} section {}.",
                query.course, section
            )));
        }

        peers.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .cmp(a_score)
                .then_with(|| b.section_score.cmp(&a.section_score))
                .then_with(|| b.last_active.cmp(&a.last_active))
        });

        Ok(peers.into_iter().map(|(_, peer)| peer).collect())
    }

    /// Stores the requester's ride request (replacing any earlier one) and
    /// returns opted-in users whose request or commute overlaps it.
    pub async fn find_ride_matches(
        &self,
        requester_id: i64,
        query: &RideQuery,
    ) -> BotResult<RideMatches> {
        let pool = &self.db.pool;
        let timeout = self.settings.store_timeout;

        if with_timeout(timeout, "load requester profile", Profile::find(pool, requester_id))
            .await?
            .is_none()
        {
            return Err(BotError::not_found(
                "Create your profile with /profile set before sharing a ride.",
            ));
        }

        let ride_time = format_clock_time(&query.time);
        let request = with_timeout(
            timeout,
            "store ride request",
            RideRequest::upsert(pool, requester_id, &query.from, &query.to, &ride_time),
        )
        .await?;

        let profiles = with_timeout(
            timeout,
            "load opted-in profiles",
            Profile::find_ride_opted_in(pool, requester_id),
        )
        .await?;
        let requests = with_timeout(
            timeout,
            "load ride requests",
            RideRequest::find_opted_in_excluding(pool, requester_id),
        )
        .await?;

        let by_user: HashMap<i64, &Profile> = profiles.iter().map(|p| (p.user_id, p)).collect();
        let mut best: HashMap<i64, RideMatch> = HashMap::new();

        let routes = requests
            .iter()
            .filter_map(|r| {
                by_user.get(&r.user_id).map(|profile| {
                    (*profile, r.from_location.as_str(), r.to_location.as_str(), r.ride_time.as_str(), RouteSource::Request)
                })
            })
            .chain(profiles.iter().filter_map(|profile| {
                match (&profile.home_location, &profile.commute_destination, &profile.commute_time) {
                    (Some(from), Some(to), Some(time)) => {
                        Some((profile, from.as_str(), to.as_str(), time.as_str(), RouteSource::Commute))
                    }
                    _ => None,
                }
            }));

        for (profile, from, to, time, source) in routes {
            let Some(candidate) = self.score_route(query, profile, from, to, time, source) else {
                continue;
            };
            let replace = best
                .get(&profile.user_id)
                .map_or(true, |current| candidate.score > current.score);
            if replace {
                best.insert(profile.user_id, candidate);
            }
        }

        let mut matches: Vec<RideMatch> = best.into_values().collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.last_active.cmp(&a.last_active))
        });

        if matches.is_empty() {
            return Err(BotError::not_found(format!(
                "No rides found from {} to {} around {}. Your request is saved and you'll hear from matching riders.",
                query.from, query.to, ride_time
            )));
        }

        let notifications = self.dispatcher.as_ref().map(|dispatcher| {
            let dispatcher = dispatcher.clone();
            let request = request.clone();
            let matches = matches.clone();
            tokio::spawn(async move { dispatcher.dispatch(&request, &matches).await })
        });

        Ok(RideMatches {
            request,
            matches,
            notifications,
        })
    }

    pub async fn cancel_ride(&self, requester_id: i64) -> BotResult<bool> {
        with_timeout(
            self.settings.store_timeout,
            "delete ride request",
            RideRequest::delete_by_user(&self.db.pool, requester_id),
        )
        .await
    }

    pub async fn active_ride(&self, requester_id: i64) -> BotResult<Option<RideRequest>> {
        with_timeout(
            self.settings.store_timeout,
            "load ride request",
            RideRequest::find_by_user(&self.db.pool, requester_id),
        )
        .await
    }

    /// Every other user enrolled in `course`, one entry per user, ranked.
    async fn course_candidates(&self, requester_id: i64, course: &str) -> BotResult<Vec<StudyMatch>> {
        let wanted = course_key(course);
        if wanted.is_empty() {
            return Err(BotError::validation("Course code cannot be empty."));
        }

        let timeout = self.settings.store_timeout;
        let pool = &self.db.pool;

        let enrollments = with_timeout(
            timeout,
            "load course enrollments",
            EnrollmentCandidate::find_excluding(pool, requester_id),
        )
        .await?;
        let own_courses = with_timeout(
            timeout,
            "load requester courses",
            Profile::courses(pool, requester_id),
        )
        .await?;

        let own_section = own_courses
            .iter()
            .find(|own| course_key(&own.course_code) == wanted)
            .and_then(|own| own.section.clone());

        let mut best: HashMap<i64, StudyMatch> = HashMap::new();
        for enrollment in enrollments {
            // The requester never appears in their own results
            if enrollment.user_id == requester_id {
                continue;
            }

            if course_key(&enrollment.course_code) != wanted {
                continue;
            }

            let section_score = match (own_section.as_deref(), enrollment.section.as_deref()) {
                (Some(own), Some(theirs)) => self.section_matcher.score(own, theirs).unwrap_or(0),
                _ => 0,
            };

            let candidate = StudyMatch {
                user_id: enrollment.user_id,
                display_name: display_name(enrollment.username.as_deref(), enrollment.user_id),
                department: enrollment.department,
                year: enrollment.year,
                contacts: parse_contacts(&enrollment.contacts),
                course_code: enrollment.course_code,
                section: enrollment.section,
                section_score,
                last_active: enrollment.last_active,
            };

            let replace = best
                .get(&candidate.user_id)
                .map_or(true, |current| rank_study(&candidate, current) == Ordering::Less);
            if replace {
                best.insert(candidate.user_id, candidate);
            }
        }

        let mut partners: Vec<StudyMatch> = best.into_values().collect();
        partners.sort_by(rank_study);
        Ok(partners)
    }

    fn score_route(
        &self,
        query: &RideQuery,
        profile: &Profile,
        from: &str,
        to: &str,
        time: &str,
        source: RouteSource,
    ) -> Option<RideMatch> {
        let from_score = self.location_score(&query.from, from)?;
        let to_score = self.location_score(&query.to, to)?;

        let candidate_time = parse_clock_time(time).ok()?;
        let offset = clock_distance_minutes(&query.time, &candidate_time);
        let tolerance = self.settings.time_tolerance_minutes;
        if offset > tolerance {
            return None;
        }

        let time_score = if tolerance == 0 {
            100.0
        } else {
            100.0 * (1.0 - offset as f64 / tolerance as f64)
        };
        let score = f64::from(from_score) * FROM_WEIGHT
            + f64::from(to_score) * TO_WEIGHT
            + time_score * TIME_WEIGHT;

        Some(RideMatch {
            user_id: profile.user_id,
            display_name: profile.display_name(),
            department: profile.department.clone(),
            contacts: profile.contacts_map(),
            from_location: from.to_string(),
            to_location: to.to_string(),
            ride_time: format_clock_time(&candidate_time),
            source,
            from_score,
            to_score,
            time_offset_minutes: offset,
            score,
            last_active: profile.last_active.clone(),
        })
    }

    /// Stored locations were validated on the way in; one that no longer
    /// scores is treated as a non-match rather than failing the search.
    fn location_score(&self, wanted: &str, stored: &str) -> Option<u8> {
        match self.location_matcher.matching_score(wanted, stored) {
            Ok(score) => score,
            Err(e) => {
                tracing::debug!("Skipping unscorable location '{}': {}", stored, e);
                None
            }
        }
    }
}

/// Course codes compare case-insensitively with inner whitespace ignored.
fn course_key(course: &str) -> String {
    normalize(course).replace(' ', "")
}

fn rank_study(a: &StudyMatch, b: &StudyMatch) -> Ordering {
    b.section_score
        .cmp(&a.section_score)
        .then_with(|| b.last_active.cmp(&a.last_active))
}
