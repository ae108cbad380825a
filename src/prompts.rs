//! Prompts for the question extractor.
//!
//! Every string sent to the model lives here so the wording can be changed,
//! and inspected by tests, without touching the request plumbing in
//! [`crate::pipeline::inference`].

/// System prompt framing the model as a document analyst.
pub const QUIZ_SYSTEM_PROMPT: &str = "You are an expert document analyst. Your task is to identify a question and describe the associated image in the provided PDF document. Additionally, you should create a new similar question and describe an image that could be associated to that question.";

/// Instruction text preceding the question choice.
const QUIZ_INSTRUCTION_HEAD: &str = "Identify the lesson name present in the document. Identify all the questions present in the document.";

/// Instruction text following the question choice, ending with the exact
/// JSON shape the model should reply with (see [`crate::output::QUIZ_FIELDS`]).
const QUIZ_INSTRUCTION_TAIL: &str = r#"Write down the chosen question and ensure it is trimmed of any extra whitespace. If the question includes any blank space, mark that clearly with '_____'. Determine if the chosen question is multiple choice (provides answer options) or open ended. If it's multiple choice, extract all the answer options. Calculate the mathematically correct answer to the chosen question. Describe the image associated with the chosen question in very clear terms, including any numbers that might be included within the image (if an image is associated with the question). Based on this chosen question, create a new, mathematically valid and correct maths question of the *same type* (multiple choice if the original was, open ended if the original was) that would be suitable for a similar level/age group. If the new question is multiple choice, generate three plausible incorrect answer options in addition to the correct answer. Ensure the new question is trimmed of any extra whitespace and provide its correct answer. For the new question, describe a potential image that could be associated with it, ensuring that the image provides hints to help the student work out the answer without directly giving the solution. The image description should offer visual cues or representations that guide the student's thinking process rather than explicitly showing the answer. Return all this information as a single JSON object with exactly this format: { "lesson_name": "[name of the lesson]", "original_question": "[trimmed question text]", "original_answer_options": "[a list of answer options if present, otherwise 'N/A']","original_correct_answer": "[answer to original question]", "original_imageDescription": "[description of image for original question]", "new_question": "[trimmed new question text]", "new_answer_options": "[a list of answer options if generated, otherwise 'N/A']", "new_correct_answer": "[correct answer to new question]", "new_imageDescription": "[description of potential image for new question]" }"#;

/// Sentence selecting which question the model should work on.
///
/// Indices up to 1 ask for "the first"; anything larger substitutes the
/// numeral as-is ("Choose the 3 of these questions."), with no ordinal
/// suffix.
pub fn choose_question_instruction(question_number: i64) -> String {
    if question_number > 1 {
        format!("Choose the {question_number} of these questions.")
    } else {
        "Choose the first of these questions.".to_string()
    }
}

/// Full user instruction sent next to the PDF document block.
pub fn quiz_instruction(question_number: i64) -> String {
    format!(
        "{QUIZ_INSTRUCTION_HEAD} {} {QUIZ_INSTRUCTION_TAIL}",
        choose_question_instruction(question_number)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_one_ask_for_the_first_question() {
        assert_eq!(
            choose_question_instruction(0),
            "Choose the first of these questions."
        );
        assert_eq!(
            choose_question_instruction(1),
            "Choose the first of these questions."
        );
        assert_eq!(
            choose_question_instruction(-4),
            "Choose the first of these questions."
        );
    }

    #[test]
    fn larger_indices_use_the_bare_numeral() {
        assert_eq!(
            choose_question_instruction(3),
            "Choose the 3 of these questions."
        );
        assert_eq!(
            choose_question_instruction(12),
            "Choose the 12 of these questions."
        );
    }

    #[test]
    fn instruction_embeds_choice_between_head_and_tail() {
        let text = quiz_instruction(3);
        let head = text.find("Identify all the questions").unwrap();
        let choice = text.find("Choose the 3 of these questions.").unwrap();
        let tail = text.find("Write down the chosen question").unwrap();
        assert!(head < choice && choice < tail);
    }

    #[test]
    fn instruction_lists_all_nine_fields() {
        let text = quiz_instruction(1);
        for field in [
            "lesson_name",
            "original_question",
            "original_answer_options",
            "original_correct_answer",
            "original_imageDescription",
            "new_question",
            "new_answer_options",
            "new_correct_answer",
            "new_imageDescription",
        ] {
            assert!(text.contains(&format!("\"{field}\"")), "missing {field}");
        }
    }
}
