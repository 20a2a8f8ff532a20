//! FAQ keyword search over an already-fetched FAQ set. Case-insensitive
//! substring match against question and answer, plus a bidirectional check
//! against keyword tags so a short query hits a longer tag and vice versa.

use crate::api::FaqItemResponse;

pub fn matches(faq: &FaqItemResponse, query: &str) -> bool {
    let query = query.to_lowercase();
    if query.is_empty() {
        return true;
    }

    if faq.question.to_lowercase().contains(&query) || faq.answer.to_lowercase().contains(&query) {
        return true;
    }

    faq.keywords.iter().any(|keyword| {
        let keyword = keyword.to_lowercase();
        keyword.contains(&query) || query.contains(&keyword)
    })
}

/// Filter the FAQ set by `query`. An empty query returns everything.
pub fn search(faqs: &[FaqItemResponse], query: &str) -> Vec<FaqItemResponse> {
    faqs.iter().filter(|f| matches(f, query)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn faq(question: &str, answer: &str, keywords: &[&str]) -> FaqItemResponse {
        FaqItemResponse {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            category: "general".into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn matches_question_and_answer_text() {
        let f = faq(
            "How do I open a bank account?",
            "Bring your passport and I-20 to a local branch.",
            &[],
        );
        assert!(matches(&f, "bank"));
        assert!(matches(&f, "PASSPORT"));
        assert!(!matches(&f, "housing"));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        // "visa" must hit even though the word never appears in the text
        let f = faq(
            "What documents do I need before traveling?",
            "Check the embassy requirements for your country.",
            &["Visa"],
        );
        assert!(matches(&f, "visa"));
    }

    #[test]
    fn keyword_match_is_bidirectional() {
        // query "visa" is a substring of the tag "visa-related topics"
        let f = faq("Where can I get help?", "Ask the office.", &["visa-related topics"]);
        assert!(matches(&f, "visa"));

        // and a long query containing a short tag also hits
        let g = faq("Where can I get help?", "Ask the office.", &["opt"]);
        assert!(matches(&g, "opt extension deadline"));
    }

    #[test]
    fn empty_query_returns_everything() {
        let faqs = vec![
            faq("A?", "a", &[]),
            faq("B?", "b", &[]),
        ];
        assert_eq!(search(&faqs, "").len(), 2);
    }

    #[test]
    fn search_filters() {
        let faqs = vec![
            faq("How do I find housing?", "Use the portal.", &["housing"]),
            faq("When is orientation?", "First week of term.", &["orientation"]),
        ];
        let hits = search(&faqs, "housing");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].question, "How do I find housing?");
    }
}
