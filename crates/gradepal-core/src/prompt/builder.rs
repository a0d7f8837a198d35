//! System prompt builder for chat turns.
//!
//! Layout, one section per line group:
//! ```text
//! You are a student performance assistant. ...
//! User profile: ...
//!
//! Recent conversation history:
//! (N earlier messages omitted)
//! User: ... / Assistant: ...
//!
//! GPA/Stats: ...
//! Subjects: a; b; c
//! Assessments: ...
//! Grades: ...                 (students)
//! Students: ... / Recent grades: ...   (lecturers)
//!
//! Common requests / Hard constraints / Response style / Guidelines
//! ```

use gradepal_types::snapshot::AcademicSnapshot;

use super::history::WindowedHistory;

const ROLE_LINE: &str =
    "You are a student performance assistant. Answer concisely, in markdown, with actionable next steps.";

const COMMON_REQUESTS: &[&str] = &[
    "Common requests to support:",
    "- Grade lookups, GPA explanations, missing scores, and recent graded assessments.",
    "- Predictions for target scores; study plans/schedules; learning resources.",
    "- Lecturer analytics: distributions, averages, at-risk lists, reweighting ideas, feedback templates.",
    "- Assessment help: weight splits, rubrics, sample exam questions.",
];

const HARD_CONSTRAINTS: &[&str] = &[
    "Hard constraints (do not violate):",
    "- Do NOT fabricate or infer averages, medians, distributions, final grades, at-risk lists, or hypothetical outcomes unless provided.",
    "- If a requested statistic is missing, explicitly say it is unavailable, name the missing computation, describe how it would be computed, and offer qualitative guidance only.",
    "- Predictions are allowed only when all weights/current scores are provided, or when a weighted average AND remaining weight are provided. Otherwise, ask for the missing inputs and explain the formula; label any assumption clearly.",
    "- For lecturer prompts: you may discuss trends/patterns/completeness, but do NOT report averages/distributions/percent-below/rankings unless given. Instead, state what is needed from backend computations.",
    "- For students: do NOT infer subject-level performance without provided subject averages; list ungraded/unrecorded assessments instead of guessing scores.",
    "- Prefer correctness over completeness; be transparent about limitations; suggest the next actionable step (e.g., record grades, provide weights, fetch analytics) when blocked.",
];

const RESPONSE_STYLE: &[&str] = &[
    "Response style:",
    "- Answer in natural, conversational paragraphs.",
    "- Use bullet points ONLY for listing items.",
    "- NEVER start your entire response with a bullet point.",
    "- Be brief and clear, including numbers/percentages when known.",
    "- If data is missing, say so and list what is needed to answer accurately.",
    "- Offer a next step when appropriate (e.g., record grades, verify subject code).",
];

const LECTURER_GUIDELINES: &[&str] = &[
    "- You are advising a lecturer; focus on class-wide insights, distributions, at-risk students, and assessment planning.",
    "- Use studentNumber or name and recent grades when asked about specific students; highlight missing data and suggest actions (record grades, verify weights).",
];

const STUDENT_GUIDELINES: &[&str] = &[
    "- For students: cite GPA, recent assessments, and weights; list missing grades or unknown assessments explicitly.",
    "- If asked for predictions, use available weights/scores; if missing, state the assumption or ask for the needed numbers.",
];

/// Builds the system prompt from a snapshot and windowed history.
pub struct SystemPromptBuilder;

impl SystemPromptBuilder {
    pub fn build(snapshot: &AcademicSnapshot, history: &WindowedHistory) -> String {
        let mut lines: Vec<String> = vec![
            ROLE_LINE.to_string(),
            format!("User profile: {}", snapshot.profile()),
        ];

        if !history.is_empty() {
            lines.push(String::new());
            lines.push("Recent conversation history:".to_string());
            if history.omitted > 0 {
                lines.push(format!("({} earlier messages omitted)", history.omitted));
            }
            lines.extend(history.lines.iter().cloned());
            lines.push(String::new());
        }

        if !snapshot.stats().is_empty() {
            lines.push(format!("GPA/Stats: {}", snapshot.stats()));
        }
        push_list(&mut lines, "Subjects", snapshot.subjects());
        push_list(&mut lines, "Assessments", snapshot.assessments());

        let guidelines = match snapshot {
            AcademicSnapshot::Student(s) => {
                push_list(&mut lines, "Grades", &s.grades);
                STUDENT_GUIDELINES
            }
            AcademicSnapshot::Lecturer(l) => {
                push_list(&mut lines, "Students", &l.students);
                push_list(&mut lines, "Recent grades", &l.recent_grades);
                LECTURER_GUIDELINES
            }
        };

        for block in [COMMON_REQUESTS, HARD_CONSTRAINTS, RESPONSE_STYLE] {
            lines.push(String::new());
            lines.extend(block.iter().map(|l| l.to_string()));
        }
        lines.push(String::new());
        lines.push("Guidelines:".to_string());
        lines.extend(guidelines.iter().map(|l| l.to_string()));

        lines.join("\n")
    }
}

fn push_list(lines: &mut Vec<String>, label: &str, items: &[String]) {
    if !items.is_empty() {
        lines.push(format!("{label}: {}", items.join("; ")));
    }
}
