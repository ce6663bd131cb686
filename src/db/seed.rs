use chrono::{Duration, SecondsFormat, Utc};
use rusqlite::params;

use crate::state::DbPool;

const DEMO_PASSWORD: &str = "password123";

const SPORTS: &[&str] = &[
    "Tennis",
    "Football",
    "Basketball",
    "Yoga",
    "Running",
    "Cycling",
    "Swimming",
    "Climbing",
    "Boxing",
    "Fitness",
    "Volleyball",
    "Badminton",
];

const CITIES: &[&str] = &[
    "Paris",
    "Lyon",
    "Marseille",
    "Toulouse",
    "Bordeaux",
    "Nice",
    "Nantes",
    "Strasbourg",
];

const NAMES: &[(&str, &str)] = &[
    ("Lucas", "M"),
    ("Emma", "F"),
    ("Thomas", "M"),
    ("Lea", "F"),
    ("Hugo", "M"),
    ("Chloe", "F"),
    ("Louis", "M"),
    ("Manon", "F"),
    ("Nathan", "M"),
    ("Sarah", "F"),
];

const BIOS: &[&str] = &[
    "Always up for a new training partner",
    "Weekend runner looking for company",
    "Gym regular, happy to try team sports",
    "Training for my first triathlon",
    "Here to stay motivated together",
];

/// Insert a demo dataset: ten active users, one admin, one approved
/// partner and two upcoming offers. Safe to run repeatedly; existing
/// rows are left alone.
pub fn run(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;
    let password_hash = bcrypt::hash(DEMO_PASSWORD, bcrypt::DEFAULT_COST)?;

    let mut created = 0;
    for (i, (name, gender)) in NAMES.iter().enumerate() {
        let email = format!("user{}@example.com", i + 1);
        let age = 22 + ((i * 3) % 18) as i64;
        let city = CITIES[i % CITIES.len()];
        let bio = BIOS[i % BIOS.len()];
        let sports: Vec<&str> = SPORTS[i % 8..i % 8 + 3].to_vec();
        let images: Vec<String> = (1..=3)
            .map(|n| format!("https://picsum.photos/seed/matchpoint-{}-{}/800/1200", i + 1, n))
            .collect();

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users
                 (id, email, password_hash, name, age, gender, bio, location, sports, images)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                uuid::Uuid::now_v7().to_string(),
                email,
                password_hash,
                name,
                age,
                gender,
                bio,
                city,
                serde_json::to_string(&sports)?,
                serde_json::to_string(&images)?,
            ],
        )?;
        if inserted > 0 {
            created += 1;
            tracing::info!("Seeded user {} <{}>", name, email);
        }
    }

    conn.execute(
        "INSERT OR IGNORE INTO admins (id, email, password_hash, name)
         VALUES (?1, 'admin@example.com', ?2, 'Admin')",
        params![uuid::Uuid::now_v7().to_string(), password_hash],
    )?;

    let partner_id = uuid::Uuid::now_v7().to_string();
    let partner_inserted = conn.execute(
        "INSERT OR IGNORE INTO partners
             (id, email, password_hash, company_name, description, website_link, address, status)
         VALUES (?1, 'partner@example.com', ?2, 'City Sports Club',
                 'Courts, classes and coaching in the city center',
                 'https://citysports.example.com', '12 Rue du Stade, Lyon', 'APPROVED')",
        params![partner_id, password_hash],
    )?;

    // Offers only when the partner row is fresh, so reruns do not pile up
    if partner_inserted > 0 {
        let offers = [
            (
                "Tennis court hour with coach",
                25.0,
                "One hour on an indoor court with a certified coach, rackets provided",
                Utc::now() + Duration::days(7),
                "City Sports Club, Lyon",
                "Tennis",
            ),
            (
                "Sunrise yoga session",
                12.0,
                "Outdoor group session for all levels, mats available on site",
                Utc::now() + Duration::days(14),
                "Parc de la Tete d'Or, Lyon",
                "Yoga",
            ),
        ];

        for (title, price, description, datetime, location, sport) in offers {
            conn.execute(
                "INSERT INTO offers
                     (id, partner_id, title, price, description, datetime, location, image_url, sport)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    uuid::Uuid::now_v7().to_string(),
                    partner_id,
                    title,
                    price,
                    description,
                    datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
                    location,
                    format!("https://picsum.photos/seed/matchpoint-{}/800/600", sport),
                    sport,
                ],
            )?;
        }
    }

    tracing::info!(
        "Seed complete: {} new users (password: {})",
        created,
        DEMO_PASSWORD
    );
    Ok(())
}
