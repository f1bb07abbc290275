//! Local fallback question bank.
//!
//! When the question source times out or errors, the session must still be
//! able to proceed, so a canned question is substituted from this table.
//! Topic matching is simple keyword containment against the subject string;
//! anything unmatched gets the generic study-skills question.

use crate::models::assessment::{Difficulty, Level, Question};

struct CannedQuestion {
    prompt: &'static str,
    options: [&'static str; 4],
    correct: usize,
    explanation: &'static str,
}

impl CannedQuestion {
    fn to_question(&self, difficulty: Difficulty) -> Question {
        Question {
            prompt: self.prompt.to_string(),
            options: self.options.iter().map(|o| o.to_string()).collect(),
            correct_option: self.options[self.correct].to_string(),
            explanation: self.explanation.to_string(),
            difficulty,
        }
    }
}

struct FallbackTopic {
    keywords: &'static [&'static str],
    /// Indexed by difficulty: easy, medium, hard.
    questions: [CannedQuestion; 3],
}

const FALLBACK_BANK: &[FallbackTopic] = &[
    FallbackTopic {
        keywords: &["javascript", "js", "node", "typescript"],
        questions: [
            CannedQuestion {
                prompt: "Which keyword declares a block-scoped variable in JavaScript?",
                options: ["var", "let", "def", "dim"],
                correct: 1,
                explanation: "`let` (and `const`) are block-scoped; `var` is function-scoped.",
            },
            CannedQuestion {
                prompt: "What does `Promise.all` do when one of its input promises rejects?",
                options: [
                    "Waits for the remaining promises, then resolves",
                    "Rejects immediately with that promise's reason",
                    "Resolves with `undefined` for the failed slot",
                    "Retries the rejected promise once",
                ],
                correct: 1,
                explanation:
                    "`Promise.all` short-circuits: the first rejection rejects the combined promise.",
            },
            CannedQuestion {
                prompt: "In JavaScript, what is the value of `this` inside an arrow function?",
                options: [
                    "The global object, always",
                    "The object the function is called on",
                    "The `this` of the enclosing lexical scope",
                    "`undefined`, always",
                ],
                correct: 2,
                explanation:
                    "Arrow functions do not bind their own `this`; they capture it lexically.",
            },
        ],
    },
    FallbackTopic {
        keywords: &["python", "django", "flask"],
        questions: [
            CannedQuestion {
                prompt: "Which of these creates a list in Python?",
                options: ["(1, 2, 3)", "{1, 2, 3}", "[1, 2, 3]", "<1, 2, 3>"],
                correct: 2,
                explanation: "Square brackets build a list; parentheses a tuple, braces a set.",
            },
            CannedQuestion {
                prompt: "What does a Python generator function return when called?",
                options: [
                    "The first yielded value",
                    "A generator iterator",
                    "A list of all yielded values",
                    "None",
                ],
                correct: 1,
                explanation:
                    "Calling a generator function returns an iterator; the body runs lazily on `next()`.",
            },
            CannedQuestion {
                prompt: "What is the effect of the GIL in CPython?",
                options: [
                    "It prevents more than one thread from executing Python bytecode at a time",
                    "It garbage-collects unreachable objects",
                    "It compiles hot loops to machine code",
                    "It locks imported modules against reloading",
                ],
                correct: 0,
                explanation:
                    "The global interpreter lock serializes bytecode execution across threads.",
            },
        ],
    },
    FallbackTopic {
        keywords: &["rust"],
        questions: [
            CannedQuestion {
                prompt: "Which keyword makes a Rust binding mutable?",
                options: ["mut", "var", "mutable", "ref"],
                correct: 0,
                explanation: "Bindings are immutable by default; `let mut` opts into mutation.",
            },
            CannedQuestion {
                prompt: "What does the `?` operator do in a function returning `Result`?",
                options: [
                    "Panics on `Err`",
                    "Converts the value to an `Option`",
                    "Returns early with the error on `Err`, unwraps on `Ok`",
                    "Retries the expression once",
                ],
                correct: 2,
                explanation:
                    "`?` propagates errors to the caller via `From` conversion and early return.",
            },
            CannedQuestion {
                prompt: "Why does this fail: taking two `&mut` references to the same value?",
                options: [
                    "References are always immutable",
                    "Aliasing XOR mutation: at most one exclusive borrow may be live",
                    "`&mut` requires the `unsafe` keyword",
                    "The borrow checker only allows borrows inside functions",
                ],
                correct: 1,
                explanation:
                    "Rust's borrow rules permit many shared borrows or one exclusive borrow, never both.",
            },
        ],
    },
    FallbackTopic {
        keywords: &["sql", "database", "postgres", "mysql"],
        questions: [
            CannedQuestion {
                prompt: "Which SQL clause filters rows before grouping?",
                options: ["HAVING", "WHERE", "ORDER BY", "LIMIT"],
                correct: 1,
                explanation: "`WHERE` filters rows; `HAVING` filters groups after `GROUP BY`.",
            },
            CannedQuestion {
                prompt: "What does a LEFT JOIN return when the right table has no match?",
                options: [
                    "The row is dropped",
                    "The left row with NULLs for right-table columns",
                    "An error",
                    "A duplicate of the left row",
                ],
                correct: 1,
                explanation: "LEFT JOIN preserves every left row, padding unmatched columns with NULL.",
            },
            CannedQuestion {
                prompt: "Which isolation level allows non-repeatable reads but not dirty reads?",
                options: [
                    "Read uncommitted",
                    "Read committed",
                    "Repeatable read",
                    "Serializable",
                ],
                correct: 1,
                explanation:
                    "Read committed sees only committed data but may see different values across reads.",
            },
        ],
    },
    FallbackTopic {
        keywords: &["react", "frontend", "front-end"],
        questions: [
            CannedQuestion {
                prompt: "Which hook stores local state in a React function component?",
                options: ["useEffect", "useState", "useMemo", "useRef"],
                correct: 1,
                explanation: "`useState` returns the current value and a setter that re-renders.",
            },
            CannedQuestion {
                prompt: "When does a `useEffect` with an empty dependency array run?",
                options: [
                    "After every render",
                    "Once, after the first render",
                    "Before the first render",
                    "Only when state changes",
                ],
                correct: 1,
                explanation: "An empty array means no dependency ever changes, so it runs once on mount.",
            },
            CannedQuestion {
                prompt: "Why must list items rendered from an array carry a stable `key`?",
                options: [
                    "Keys are required for CSS styling",
                    "React uses keys to match elements across renders during reconciliation",
                    "Keys enable server-side rendering",
                    "Without keys the array cannot be mapped",
                ],
                correct: 1,
                explanation:
                    "Keys let the reconciler track identity, avoiding state loss and wasted re-renders.",
            },
        ],
    },
];

/// Used when no topic keyword matches the subject.
const GENERIC_FALLBACK: FallbackTopic = FallbackTopic {
    keywords: &[],
    questions: [
        CannedQuestion {
            prompt: "Which practice most improves long-term retention of a new skill?",
            options: [
                "Rereading notes in one sitting",
                "Spaced practice with self-testing",
                "Highlighting key passages",
                "Watching tutorials back to back",
            ],
            correct: 1,
            explanation: "Retrieval practice spaced over time outperforms passive review.",
        },
        CannedQuestion {
            prompt: "You hit a bug you don't understand. What is the most effective first step?",
            options: [
                "Rewrite the module from scratch",
                "Reproduce it with the smallest possible input",
                "Add logging everywhere and rerun",
                "Search for a library that hides the problem",
            ],
            correct: 1,
            explanation: "A minimal reproduction isolates the cause and makes every later step cheaper.",
        },
        CannedQuestion {
            prompt: "What distinguishes deliberate practice from routine repetition?",
            options: [
                "It takes more hours in total",
                "It targets specific weaknesses with immediate feedback",
                "It avoids difficult material until fundamentals are perfect",
                "It requires a formal classroom setting",
            ],
            correct: 1,
            explanation:
                "Deliberate practice works at the edge of ability with feedback, not inside the comfort zone.",
        },
    ],
};

/// Picks a fallback question for the subject at the session's level.
/// Always succeeds — that is the point of the fallback path.
pub fn fallback_question(subject: &str, level: Level) -> Question {
    let topic = find_topic(subject).unwrap_or(&GENERIC_FALLBACK);
    let difficulty = level.difficulty();
    let idx = match difficulty {
        Difficulty::Easy => 0,
        Difficulty::Medium => 1,
        Difficulty::Hard => 2,
    };
    topic.questions[idx].to_question(difficulty)
}

fn find_topic(subject: &str) -> Option<&'static FallbackTopic> {
    let subject = subject.to_lowercase();
    FALLBACK_BANK
        .iter()
        .find(|topic| topic.keywords.iter().any(|k| subject.contains(k)))
}
