//! The `quizforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizforge.toml").exists() {
        println!("quizforge.toml already exists, skipping.");
    } else {
        std::fs::write("quizforge.toml", SAMPLE_CONFIG)?;
        println!("Created quizforge.toml");
    }

    std::fs::create_dir_all("question-sets")?;
    let sample_path = std::path::Path::new("question-sets/sample.toml");
    if sample_path.exists() {
        println!("question-sets/sample.toml already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_QUESTION_SET)?;
        println!("Created question-sets/sample.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: quizforge validate --question-set question-sets/sample.toml");
    println!("  2. Run: quizforge run --question-set sample");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

question_dir = "question-sets"
show_explanations = true
shuffle_matching = true
# report_dir = "reports"
"#;

const SAMPLE_QUESTION_SET: &str = r#"id = "sample"
topic = "Rust basics"

[[context]]
number = 1
title = "The Rust Programming Language, ch. 4"
content = "Understanding ownership"
url = "https://doc.rust-lang.org/book/ch04-00-understanding-ownership.html"

[[questions]]
id = "owner-count"
type = "multiple_choice"
text = "How many owners can a value have at a time?"
difficulty = "basic"
explanation = "Each value has exactly one owner; ownership moves on assignment."
citations = [1]

[[questions.options]]
id = "one"
text = "Exactly one"
is_correct = true

[[questions.options]]
id = "two"
text = "At most two"

[[questions.options]]
id = "any"
text = "Any number"

[[questions]]
id = "gc"
type = "true_false"
text = "Rust frees memory with a tracing garbage collector."
difficulty = "basic"
explanation = "Values are dropped when their owner goes out of scope."

[[questions.options]]
id = "true"
text = "True"

[[questions.options]]
id = "false"
text = "False"
is_correct = true

[[questions]]
id = "borrow-syntax"
type = "fill_in_blank"
text = "A shared reference is written ___T and a mutable one ___T."
explanation = "`&T` borrows immutably, `&mut T` borrows mutably."
citations = [1]
blanks = ["&", "&mut|& mut"]

[[questions]]
id = "traits"
type = "matching"
text = "Match each trait to what it enables."
difficulty = "advanced"
explanation = "These traits power cloning, printing and comparison."

[[questions.pairs]]
left = "Clone"
right = "explicit duplication"

[[questions.pairs]]
left = "Display"
right = "user-facing formatting"

[[questions.pairs]]
left = "PartialEq"
right = "the == operator"

[[questions]]
id = "why-borrowing"
type = "short_answer"
text = "Why does the borrow checker forbid two mutable references at once?"
difficulty = "advanced"
explanation = "Aliasing plus mutation is the root of data races and iterator invalidation."
sample_answer = "Two live mutable references could race or invalidate each other; one writer at a time rules out data races at compile time."
"#;
