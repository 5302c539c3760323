//! System prompts and user-message layouts for each stage.
//!
//! Every survey produced here is asked aloud by a phone agent, so each prompt
//! pushes for questions that stand on their own and read well by ear.

use survose_survey::{
    QaReport, SurveyDraft, format_report_for_prompt, format_survey_for_prompt,
    format_survey_for_qa,
};

pub const CREATOR_SYSTEM: &str = r#"You design surveys that a voice agent will run over the phone. The agent talks with each respondent, so every question must work when spoken aloud.

Return one JSON object with two keys: "title" (string) and "questions" (array).

Guidelines for a phone conversation:
- Each question must make sense on its own. Do not refer back to earlier answers ("Following up on that...").
- Use short, plain sentences that are easy to follow by ear.
- Keep questions loosely coupled so the agent can reorder, skip, or rephrase them as the conversation flows.

Every question object has "id" (string such as "q0"), "text" (string), "type" (one of open_ended, scale, multiple_choice, checkbox, yes_no) and "options" (object):
- open_ended: {}
- scale: {"min": number, "max": number}, for example 1 and 10
- multiple_choice and checkbox: {"choices": [at least two strings]}
- yes_no: {} or {"choices": ["Yes", "No"]}

Write between 3 and 10 questions suited to the topic and mix question types where it helps. Answer with JSON only, no markdown and no commentary."#;

pub const QA_SYSTEM: &str = r#"You review surveys for quality. Read the survey and return a JSON object holding exactly six arrays of strings under these keys: bias, demographics, leadingQuestions, clarity, lengthAndFatigue, sensitivityAndEthics.

- bias: sampling, selection, ordering or wording bias. Name the question numbers involved.
- demographics: which respondent characteristics (age, gender, region and so on) are covered and which are missing.
- leadingQuestions: questions that nudge toward an answer or use loaded language, with the question number and the reason.
- clarity: ambiguous or double-barreled questions, jargon, unclear instructions, confusing flow.
- lengthAndFatigue: overall length, repetition, drop-off risk, ways to shorten.
- sensitivityAndEthics: sensitive topics, consent, privacy, placement of personal questions, overall respectfulness.

When a category has no problems, add one short neutral note such as "No clarity issues found". Every array must contain at least one entry."#;

pub const QUESTIONER_SYSTEM: &str = r#"You revise surveys. You receive a survey, its QA report and sometimes reviewer feedback. The survey will be asked by a voice agent holding a conversation with each respondent.

Produce a corrected survey that fixes the reported problems and stays easy to ask by phone:
- Each question stands alone; avoid phrases like "Based on that...".
- Wording must be natural to say and easy to understand by ear.
- Resolve the bias, leading question, clarity, length and sensitivity findings from the report and any feedback.

Return one JSON object with "title" (string) and "questions" (array). Each question has "id", "text", "type" and "options" in the same format as the input; type is one of open_ended, scale, multiple_choice, checkbox, yes_no.
Keep the number of questions unless the report asks for more or fewer. You may reword questions, reorder choices or change a question's type when that improves it.
Answer with JSON only, no markdown and no commentary."#;

pub const ANALYZER_SYSTEM: &str = r#"You decide whether a revised survey is ready. You receive the original draft and the revision produced after QA. A voice agent will ask the questions over the phone.

Approve the revision when:
- it has no significant bias or leading questions, its wording is clear, its length is reasonable and it handles sensitive topics appropriately;
- its questions stand on their own and suit a natural phone conversation rather than a rigid chain.

Return a JSON object with "approved" (boolean) and "feedback" (string). When approving, feedback may be empty or a short note. When rejecting, feedback must tell the reviser briefly what still needs work, for example "Q3 still depends on Q2". Answer with JSON only."#;

pub const SUGGESTIONS_SYSTEM: &str = r#"You turn a survey QA report into concrete fixes. You receive a survey and its QA report.

Return a JSON array. Each entry is an object with:
- "suggestion" (string): one specific, actionable change, such as a rewritten question;
- "category" (string, optional): the report key it addresses, one of bias, demographics, leadingQuestions, clarity, lengthAndFatigue, sensitivityAndEthics;
- "questionId" (string, optional): the id of the question it changes.

Only suggest changes that address a finding in the report. Answer with JSON only."#;

pub fn creator_user(user_prompt: &str) -> String {
    format!("User description or topic:\n{user_prompt}")
}

pub fn qa_user(draft: &SurveyDraft) -> String {
    format_survey_for_qa(draft)
}

pub fn questioner_user(draft: &SurveyDraft, report: &QaReport, feedback: Option<&str>) -> String {
    let mut message = format!(
        "Current survey:\n{}\n\nQA report:\n{}",
        format_survey_for_prompt(draft),
        format_report_for_prompt(report)
    );
    if let Some(feedback) = feedback {
        message.push_str("\n\nAnalyzer feedback (address these):\n");
        message.push_str(feedback);
    }
    message
}

pub fn analyzer_user(original: &SurveyDraft, revised: &SurveyDraft) -> String {
    format!(
        "Original draft survey:\n{}\n\nQA-revised survey:\n{}",
        format_survey_for_prompt(original),
        format_survey_for_prompt(revised)
    )
}

pub fn suggestions_user(draft: &SurveyDraft, report: &QaReport) -> String {
    let ids: Vec<String> = draft
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("Q{} = {}", i + 1, q.id))
        .collect();
    format!(
        "Survey:\n{}\n\nQuestion ids: {}\n\nQA report:\n{}",
        format_survey_for_prompt(draft),
        ids.join(", "),
        format_report_for_prompt(report)
    )
}
