//! Operator commands that write straight to the local database: create
//! users, issue bearer tokens, and seed a demo dataset.

use console::style;

use gradepal_core::records::repository::RecordsRepository;
use gradepal_infra::sqlite::identity::SqliteIdentityRepository;
use gradepal_infra::sqlite::pool::DatabasePool;
use gradepal_infra::sqlite::records::SqliteRecordsRepository;
use gradepal_types::error::RepositoryError;
use gradepal_types::identity::{ChatUser, UserRole};
use gradepal_types::records::GradeInput;

/// Create a user.
pub async fn add_user(
    pool: DatabasePool,
    username: &str,
    full_name: &str,
    role: UserRole,
    student_number: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let identity = SqliteIdentityRepository::new(pool);
    let user = identity
        .create_user(username, full_name, role, student_number)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!();
        println!(
            "  {} Created {} {}",
            style("✓").green().bold(),
            user.role,
            style(&user.username).cyan()
        );
        println!("  {}  {}", style("ID:").bold(), style(user.id).dim());
        println!();
    }
    Ok(())
}

/// Issue a new bearer token for an existing user.
pub async fn issue_token(pool: DatabasePool, username: &str, json: bool) -> anyhow::Result<()> {
    let identity = SqliteIdentityRepository::new(pool);
    let user = identity
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!("No user named '{username}'. Create one with: gradepal add-user")
        })?;
    let token = identity.issue_token(&user.id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "username": user.username, "token": token })
        );
    } else {
        print_token(&user, &token);
    }
    Ok(())
}

/// Seed one lecturer, two students, a subject with two assessments, and two
/// grades, then print a token for every seeded user.
pub async fn seed_demo(pool: DatabasePool, json: bool) -> anyhow::Result<()> {
    let identity = SqliteIdentityRepository::new(pool.clone());
    let records = SqliteRecordsRepository::new(pool);

    let lecturer = create_demo_user(
        &identity,
        "lecturer1",
        "Dr Naledi Dlamini",
        UserRole::Lecturer,
        None,
    )
    .await?;
    let thandi = create_demo_user(
        &identity,
        "student1",
        "Thandi Nkosi",
        UserRole::Student,
        Some("S1001"),
    )
    .await?;
    let sipho = create_demo_user(
        &identity,
        "student2",
        "Sipho Zulu",
        UserRole::Student,
        Some("S1002"),
    )
    .await?;

    let subject = records
        .create_subject(&lecturer.id, "CS101", "Introduction to Programming")
        .await?;
    records.enroll(&thandi.id, &subject.id).await?;
    records.enroll(&sipho.id, &subject.id).await?;

    let assignment = records
        .create_assessment(&subject.id, "Assignment 1", 100.0, 30.0)
        .await?;
    let exam = records
        .create_assessment(&subject.id, "Final Exam", 100.0, 70.0)
        .await?;

    for (assessment_id, score) in [(assignment.id, 50.0), (exam.id, 80.0)] {
        records
            .upsert_grade(&GradeInput {
                assessment_id,
                student_id: thandi.id,
                student_number: "S1001".to_string(),
                score,
            })
            .await?;
    }

    let mut issued = Vec::new();
    for user in [&lecturer, &thandi, &sipho] {
        issued.push((user, identity.issue_token(&user.id).await?));
    }

    if json {
        let tokens: Vec<_> = issued
            .iter()
            .map(|(user, token)| {
                serde_json::json!({ "username": user.username, "role": user.role, "token": token })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        println!();
        println!(
            "  {} Seeded {} with 2 assessments and 2 students",
            style("✓").green().bold(),
            style(subject.code).cyan()
        );
        for (user, token) in &issued {
            print_token(user, token);
        }
    }
    Ok(())
}

async fn create_demo_user(
    identity: &SqliteIdentityRepository,
    username: &str,
    full_name: &str,
    role: UserRole,
    student_number: Option<&str>,
) -> anyhow::Result<ChatUser> {
    match identity
        .create_user(username, full_name, role, student_number)
        .await
    {
        Ok(user) => Ok(user),
        Err(RepositoryError::Conflict(_)) => {
            anyhow::bail!("Demo data already present ('{username}' exists)")
        }
        Err(e) => Err(e.into()),
    }
}

fn print_token(user: &ChatUser, token: &str) {
    println!();
    println!(
        "  {} Token for {} ({}), shown once:",
        style("🔑").bold(),
        style(&user.username).cyan(),
        user.role
    );
    println!("  {}", style(token).yellow().bold());
    println!();
}
