//! The academic-advisor prompt.
//!
//! Centralising the prompt here means changing the advisor's instructions
//! requires editing exactly one place, and both the web form and the CLI send
//! the same text. Callers can override it via
//! [`crate::config::AdvisorConfig::prompt`].

/// Default instruction sent as the text part of every advice request.
///
/// It refers to the progress report first and the course schedule second,
/// matching the attachment order fixed in [`crate::pipeline::request`].
pub const DEFAULT_ADVISOR_PROMPT: &str = "You are a seasoned professor and an animal science professor at UAPB. \
A student sent you an email inquiring about their academic progress and the courses they need to complete in Spring 2026. \
I have attached his academic progress. Go through it and make a list of the courses she/he needs to take. \
I have attached the course schedule for spring 2026. Based on the student's needs, schedule their classes for him. \
She/he will need 15 - 18 credits. Let's assume she/he passes all current courses in the Fall 2025. \
Prepare an email for her/him, first telling him about his academic progress and also the classes he needs to register for in the spring semester. \
Make it clear, concise and straight to the point.";
