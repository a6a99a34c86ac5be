use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

use crate::utils::datetime::{now_timestamp, to_db_timestamp};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub username: Option<String>,
    pub department: String,
    pub year: i64,
    pub contacts: String, // JSON object channel -> handle
    pub ride_opt_in: bool,
    pub home_location: Option<String>,
    pub commute_destination: Option<String>,
    pub commute_time: Option<String>,
    pub last_active: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProfileCourse {
    pub user_id: i64,
    pub course_code: String,
    pub section: Option<String>,
}

/// One course enrollment joined with the owning profile, as loaded for matching.
#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentCandidate {
    pub user_id: i64,
    pub course_code: String,
    pub section: Option<String>,
    pub username: Option<String>,
    pub department: String,
    pub year: i64,
    pub contacts: String,
    pub last_active: String,
}

/// Validated input for creating or replacing a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub department: String,
    pub year: i64,
    /// course code -> optional section
    pub courses: BTreeMap<String, Option<String>>,
    pub contacts: BTreeMap<String, String>,
    pub ride_opt_in: bool,
}

/// A stored daily route used for ride matching when no explicit request exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commute {
    pub from_location: String,
    pub to_location: String,
    pub time: String,
}

const PROFILE_COLUMNS: &str = "user_id, username, department, year, contacts, ride_opt_in, home_location, commute_destination, commute_time, last_active, created_at";

impl Profile {
    /// Creates or replaces a profile and its course set in one transaction.
    /// The stored commute survives a profile update.
    pub async fn upsert(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        username: Option<String>,
        draft: &ProfileDraft,
    ) -> Result<Self, sqlx::Error> {
        let now = now_timestamp();
        let contacts = serde_json::to_string(&draft.contacts)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, username, department, year, contacts, ride_opt_in, last_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                department = excluded.department,
                year = excluded.year,
                contacts = excluded.contacts,
                ride_opt_in = excluded.ride_opt_in,
                last_active = excluded.last_active
            "#,
        )
        .bind(user_id)
        .bind(&username)
        .bind(&draft.department)
        .bind(draft.year)
        .bind(&contacts)
        .bind(draft.ride_opt_in)
        .bind(&now)
        .bind(&now)
        .execute(&mut tx)
        .await?;

        sqlx::query("DELETE FROM profile_courses WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut tx)
            .await?;

        for (course_code, section) in &draft.courses {
            sqlx::query(
                "INSERT INTO profile_courses (user_id, course_code, section) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(course_code)
            .bind(section)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await?;

        Self::find(pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find(
        pool: &sqlx::SqlitePool,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn courses(
        pool: &sqlx::SqlitePool,
        user_id: i64,
    ) -> Result<Vec<ProfileCourse>, sqlx::Error> {
        sqlx::query_as::<_, ProfileCourse>(
            "SELECT user_id, course_code, section FROM profile_courses WHERE user_id = ? ORDER BY course_code",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Refreshes `last_active`. Returns false when the user has no profile.
    pub async fn touch(pool: &sqlx::SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE profiles SET last_active = ? WHERE user_id = ?")
            .bind(now_timestamp())
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_commute(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        commute: &Commute,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET home_location = ?, commute_destination = ?, commute_time = ?, last_active = ?
            WHERE user_id = ?
            "#,
        )
        .bind(&commute.from_location)
        .bind(&commute.to_location)
        .bind(&commute.time)
        .bind(now_timestamp())
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a profile. Courses, ride requests and their notification
    /// markers go with it through the foreign keys.
    pub async fn delete(pool: &sqlx::SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_inactive_since(
        pool: &sqlx::SqlitePool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM profiles WHERE last_active < ?")
            .bind(to_db_timestamp(&cutoff))
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_ride_opted_in(
        pool: &sqlx::SqlitePool,
        exclude_user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE ride_opt_in = TRUE AND user_id != ? ORDER BY last_active DESC"
        ))
        .bind(exclude_user_id)
        .fetch_all(pool)
        .await
    }

    pub fn contacts_map(&self) -> BTreeMap<String, String> {
        parse_contacts(&self.contacts)
    }

    pub fn commute(&self) -> Option<Commute> {
        match (&self.home_location, &self.commute_destination, &self.commute_time) {
            (Some(from), Some(to), Some(time)) => Some(Commute {
                from_location: from.clone(),
                to_location: to.clone(),
                time: time.clone(),
            }),
            _ => None,
        }
    }

    pub fn display_name(&self) -> String {
        display_name(self.username.as_deref(), self.user_id)
    }
}

impl EnrollmentCandidate {
    /// All enrollments of every profile except `exclude_user_id`.
    pub async fn find_excluding(
        pool: &sqlx::SqlitePool,
        exclude_user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, EnrollmentCandidate>(
            r#"
            SELECT pc.user_id, pc.course_code, pc.section,
                   p.username, p.department, p.year, p.contacts, p.last_active
            FROM profile_courses pc
            JOIN profiles p ON p.user_id = pc.user_id
            WHERE pc.user_id != ?
            ORDER BY p.last_active DESC
            "#,
        )
        .bind(exclude_user_id)
        .fetch_all(pool)
        .await
    }
}

/// Stored contacts are written by this crate; unreadable JSON degrades to no contacts.
pub fn parse_contacts(raw: &str) -> BTreeMap<String, String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub fn display_name(username: Option<&str>, user_id: i64) -> String {
    match username {
        Some(name) if !name.is_empty() => format!("@{name}"),
        _ => format!("user {user_id}"),
    }
}
