use std::time::Instant;

use chrono::{Datelike, Duration, Utc};
use fake::Fake;
use fake::faker::company::en::{Bs, CatchPhrase};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::{CourseSeed, InstanceSeed, SEED_PREFIX};

const BATCH_SIZE: usize = 1000;

pub fn generate_courses(count: usize) -> Vec<CourseSeed> {
    (0..count)
        .into_par_iter()
        .map(|i| {
            let title: String = CatchPhrase().fake();
            let topic: String = Bs().fake();
            CourseSeed {
                course_code: format!("{}C{:04}", SEED_PREFIX, i + 1),
                course_title: title,
                description: format!("An introduction to how teams {}.", topic),
            }
        })
        .collect()
}

/// One current instance per course plus older ones a term apart.
pub fn generate_instances(course_ids: &[i64], per_course: usize) -> Vec<InstanceSeed> {
    let today = Utc::now().date_naive();

    course_ids
        .par_iter()
        .flat_map_iter(|&course_id| {
            (0..per_course).map(move |offset| {
                let start_date = today - Duration::days(30 + 120 * offset as i64);
                let end_date = start_date + Duration::days(120);
                InstanceSeed {
                    course_id,
                    term_code: format!("{}-T{}", start_date.year(), offset + 1),
                    start_date,
                    end_date,
                }
            })
        })
        .collect()
}

pub async fn seed_courses(db: &PgPool, count: usize) -> Result<Vec<i64>, sqlx::Error> {
    let start_time = Instant::now();
    println!("📚 Seeding {} courses...", count);

    let courses = generate_courses(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(courses.len());

    for chunk in courses.chunks(BATCH_SIZE) {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO courses_master (course_code, course_title, description) ");
        builder.push_values(chunk, |mut row, course| {
            row.push_bind(&course.course_code)
                .push_bind(&course.course_title)
                .push_bind(&course.description);
        });
        builder.push(" RETURNING course_id");
        let chunk_ids: Vec<i64> = builder.build_query_scalar().fetch_all(&mut *tx).await?;
        ids.extend(chunk_ids);
    }

    tx.commit().await?;
    println!("   ✓ Inserted {} courses in {:?}", ids.len(), start_time.elapsed());
    Ok(ids)
}

pub async fn seed_instances(
    db: &PgPool,
    course_ids: &[i64],
    per_course: usize,
) -> Result<Vec<(i64, bool)>, sqlx::Error> {
    let start_time = Instant::now();
    println!("🗓️  Seeding {} instances per course...", per_course);

    let today = Utc::now().date_naive();
    let instances = generate_instances(course_ids, per_course);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(instances.len());

    for chunk in instances.chunks(BATCH_SIZE) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO course_instances (course_id, term_code, start_date, end_date) ",
        );
        builder.push_values(chunk, |mut row, instance| {
            row.push_bind(instance.course_id)
                .push_bind(&instance.term_code)
                .push_bind(instance.start_date)
                .push_bind(instance.end_date);
        });
        builder.push(" RETURNING instance_id");
        let chunk_ids: Vec<i64> = builder.build_query_scalar().fetch_all(&mut *tx).await?;
        ids.extend(
            chunk_ids
                .into_iter()
                .zip(chunk)
                .map(|(id, instance)| (id, instance.end_date >= today)),
        );
    }

    tx.commit().await?;
    println!("   ✓ Inserted {} instances in {:?}", ids.len(), start_time.elapsed());
    Ok(ids)
}
