//! Fake data for local development: courses, instances, students and
//! enrollments.
//!
//! Rows are generated in parallel with rayon and inserted in batched
//! multi-row statements. Every seeded row carries [`SEED_PREFIX`] in its
//! course code or external id so [`clear_seeded_data`] can remove exactly
//! those rows.

pub mod courses;
pub mod models;
pub mod students;

pub use models::{SEED_PASSWORD, SEED_PREFIX, SeedConfig};

use std::time::Instant;

use anyhow::Context;
use bcrypt::hash;
use sqlx::PgPool;

pub async fn seed_database(db: &PgPool, config: SeedConfig) -> anyhow::Result<()> {
    let start_time = Instant::now();
    println!("🌱 Starting database seeding...");
    println!(
        "   - {} courses × {} instances, {} students × {} enrollments",
        config.courses, config.instances_per_course, config.students, config.enrollments_per_student
    );

    // Seeded accounts share one low-cost hash.
    let password_hash = hash(SEED_PASSWORD, 4).context("Failed to hash seed password")?;

    let course_ids = courses::seed_courses(db, config.courses).await?;
    let instances = courses::seed_instances(db, &course_ids, config.instances_per_course).await?;
    let active: Vec<i64> = instances
        .iter()
        .filter(|(_, is_active)| *is_active)
        .map(|(id, _)| *id)
        .collect();

    let student_ids = students::seed_students(db, config.students, &password_hash).await?;
    let pairs = students::generate_enrollments(&student_ids, &active, config.enrollments_per_student);
    let enrolled = students::seed_enrollments(db, &pairs).await?;

    println!(
        "\n✅ Seeding complete! {} courses, {} instances, {} students, {} enrollments in {:?}",
        course_ids.len(),
        instances.len(),
        student_ids.len(),
        enrolled,
        start_time.elapsed()
    );
    println!("\n📝 Password for all seeded students: {}", SEED_PASSWORD);
    Ok(())
}

/// Deletes seeded courses and students. Instances, enrollments and content
/// go with them through cascading foreign keys.
pub async fn clear_seeded_data(db: &PgPool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");
    let pattern = format!("{}%", SEED_PREFIX);

    let mut tx = db.begin().await?;
    let courses = sqlx::query("DELETE FROM courses_master WHERE course_code LIKE $1")
        .bind(&pattern)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let users = sqlx::query("DELETE FROM users WHERE external_id LIKE $1 AND role = 'student'")
        .bind(&pattern)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    println!(
        "   ✓ Deleted {} courses and {} students in {:?}",
        courses,
        users,
        start_time.elapsed()
    );
    Ok(())
}
