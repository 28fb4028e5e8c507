use chrono::NaiveDate;

/// Prefix on every seeded course code and external id, used by `clear-seed`.
pub const SEED_PREFIX: &str = "SEED-";

pub const SEED_PASSWORD: &str = "Password123";

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub courses: usize,
    pub instances_per_course: usize,
    pub students: usize,
    pub enrollments_per_student: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            courses: 10,
            instances_per_course: 2,
            students: 200,
            enrollments_per_student: 3,
        }
    }
}

pub struct CourseSeed {
    pub course_code: String,
    pub course_title: String,
    pub description: String,
}

pub struct InstanceSeed {
    pub course_id: i64,
    pub term_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct StudentSeed {
    pub external_id: String,
    pub full_name: String,
}
