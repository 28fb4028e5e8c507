use std::time::Instant;

use fake::Fake;
use fake::faker::name::en::Name;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};

use lms_core::text::sanitize_full_name;

use super::models::{SEED_PREFIX, StudentSeed};

const BATCH_SIZE: usize = 1000;

pub fn generate_students(count: usize) -> Vec<StudentSeed> {
    (0..count)
        .into_par_iter()
        .map(|i| {
            let name: String = Name().fake();
            StudentSeed {
                external_id: format!("{}S{:06}", SEED_PREFIX, i + 1),
                full_name: sanitize_full_name(&name),
            }
        })
        .collect()
}

/// Picks `per_student` distinct instances for every student.
pub fn generate_enrollments(
    student_ids: &[i64],
    instance_ids: &[i64],
    per_student: usize,
) -> Vec<(i64, i64)> {
    student_ids
        .par_iter()
        .flat_map_iter(|&user_id| {
            let mut rng = rand::thread_rng();
            instance_ids
                .choose_multiple(&mut rng, per_student)
                .map(|&instance_id| (instance_id, user_id))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_students(
    db: &PgPool,
    count: usize,
    password_hash: &str,
) -> Result<Vec<i64>, sqlx::Error> {
    let start_time = Instant::now();
    println!("👥 Seeding {} students...", count);

    let students = generate_students(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(students.len());

    for chunk in students.chunks(BATCH_SIZE) {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO users (external_id, full_name, password_hash, role) ");
        builder.push_values(chunk, |mut row, student| {
            row.push_bind(&student.external_id)
                .push_bind(&student.full_name)
                .push_bind(password_hash)
                .push_bind("student");
        });
        builder.push(" ON CONFLICT (external_id) DO NOTHING RETURNING user_id");
        let chunk_ids: Vec<i64> = builder.build_query_scalar().fetch_all(&mut *tx).await?;
        ids.extend(chunk_ids);
    }

    tx.commit().await?;
    println!("   ✓ Inserted {} students in {:?}", ids.len(), start_time.elapsed());
    Ok(ids)
}

pub async fn seed_enrollments(db: &PgPool, pairs: &[(i64, i64)]) -> Result<u64, sqlx::Error> {
    let start_time = Instant::now();
    println!("📝 Enrolling students ({} enrollments)...", pairs.len());

    let mut tx = db.begin().await?;
    let mut inserted = 0;

    for chunk in pairs.chunks(BATCH_SIZE) {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO enrollments (instance_id, user_id) ");
        builder.push_values(chunk, |mut row, &(instance_id, user_id)| {
            row.push_bind(instance_id).push_bind(user_id);
        });
        builder.push(" ON CONFLICT (instance_id, user_id) DO NOTHING");
        inserted += builder.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    println!("   ✓ Inserted {} enrollments in {:?}", inserted, start_time.elapsed());
    Ok(inserted)
}
