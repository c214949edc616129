use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::Database;
use crate::dto::roster::RosterFilter;
use crate::error::{Result, StorageError};
use crate::models::{Course, Student};

use super::Registry;

/// Read-only queries against the course registry and student roster.
pub struct RegistryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RegistryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_course(&self, course_id: Uuid) -> Result<Course> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, name, code, credit, faculty_id
            FROM courses
            WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("course"))?;

        Ok(course)
    }

    pub async fn find_courses(&self, course_ids: &[Uuid]) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, name, code, credit, faculty_id
            FROM courses
            WHERE course_id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(course_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(courses)
    }

    pub async fn student_exists(&self, student_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM students WHERE student_id = $1)
            "#,
        )
        .bind(student_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn enrolled_courses(&self, student_id: Uuid) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT c.course_id, c.name, c.code, c.credit, c.faculty_id
            FROM courses c
            WHERE c.course_id IN (
                SELECT course_id FROM course_enrollments WHERE student_id = $1
                UNION
                SELECT course_id FROM mark_records WHERE student_id = $1
            )
            ORDER BY c.name
            "#,
        )
        .bind(student_id)
        .fetch_all(self.pool)
        .await?;

        Ok(courses)
    }

    pub async fn courses_for_faculty(&self, faculty_id: Uuid) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT course_id, name, code, credit, faculty_id
            FROM courses
            WHERE faculty_id = $1
            ORDER BY name
            "#,
        )
        .bind(faculty_id)
        .fetch_all(self.pool)
        .await?;

        Ok(courses)
    }

    pub async fn filter_students(&self, filter: &RosterFilter) -> Result<Vec<Student>> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT student_id, name, roll_number, batch_id, program_id, division_id
            FROM students
            WHERE 1=1
            "#,
        );

        if let Some(batch_id) = filter.batch_id {
            query.push(" AND batch_id = ");
            query.push_bind(batch_id);
        }

        if let Some(program_id) = filter.program_id {
            query.push(" AND program_id = ");
            query.push_bind(program_id);
        }

        if let Some(division_id) = filter.division_id {
            query.push(" AND division_id = ");
            query.push_bind(division_id);
        }

        query.push(" ORDER BY roll_number NULLS LAST, name");

        let students = query
            .build_query_as::<Student>()
            .fetch_all(self.pool)
            .await?;

        Ok(students)
    }
}

#[async_trait]
impl Registry for Database {
    async fn find_course(&self, course_id: Uuid) -> Result<Course> {
        RegistryRepository::new(self.pool())
            .find_course(course_id)
            .await
    }

    async fn find_courses(&self, course_ids: &[Uuid]) -> Result<Vec<Course>> {
        RegistryRepository::new(self.pool())
            .find_courses(course_ids)
            .await
    }

    async fn student_exists(&self, student_id: Uuid) -> Result<bool> {
        RegistryRepository::new(self.pool())
            .student_exists(student_id)
            .await
    }

    async fn enrolled_courses(&self, student_id: Uuid) -> Result<Vec<Course>> {
        RegistryRepository::new(self.pool())
            .enrolled_courses(student_id)
            .await
    }

    async fn courses_for_faculty(&self, faculty_id: Uuid) -> Result<Vec<Course>> {
        RegistryRepository::new(self.pool())
            .courses_for_faculty(faculty_id)
            .await
    }

    async fn filter_students(&self, filter: &RosterFilter) -> Result<Vec<Student>> {
        RegistryRepository::new(self.pool())
            .filter_students(filter)
            .await
    }
}
