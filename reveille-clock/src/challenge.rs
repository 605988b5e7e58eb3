//! Arithmetic challenges gating alarm dismissal.
//!
//! Pure generation: no state survives a call, and the engine re-invokes
//! [`generate`] whenever a dismissal needs a (new) question. Rendered
//! expressions always evaluate to the stored answer -- left to right
//! for plus/minus chains, with multiplication binding first -- and
//! never pass through a negative intermediate.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

use crate::alarm::ChallengeDifficulty;

/// A generated question and its expected integer answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathChallenge {
    pub question: String,
    pub answer: i64,
}

impl MathChallenge {
    /// Whether the submitted text is the correct answer.
    ///
    /// Unparsable input is simply wrong; the caller counts it as a
    /// failed attempt.
    pub fn accepts(&self, input: &str) -> bool {
        input
            .trim()
            .parse::<i64>()
            .map(|n| n == self.answer)
            .unwrap_or(false)
    }
}

/// Generate a fresh challenge for the difficulty.
pub fn generate(difficulty: ChallengeDifficulty) -> MathChallenge {
    let mut picker = Picker::new();
    match difficulty {
        ChallengeDifficulty::Easy => easy(&mut picker),
        ChallengeDifficulty::Medium => medium(&mut picker),
        ChallengeDifficulty::Hard => hard(&mut picker),
    }
}

fn easy(picker: &mut Picker) -> MathChallenge {
    let a = picker.in_range(1, 10);
    let b = picker.in_range(1, 10);

    if picker.coin() {
        MathChallenge {
            question: format!("{a} + {b}"),
            answer: a + b,
        }
    } else {
        let (hi, lo) = ordered(a, b);
        MathChallenge {
            question: format!("{hi} - {lo}"),
            answer: hi - lo,
        }
    }
}

fn medium(picker: &mut Picker) -> MathChallenge {
    match picker.pick(3) {
        0 => {
            let a = picker.in_range(5, 20);
            let b = picker.in_range(5, 15);
            MathChallenge {
                question: format!("{a} + {b}"),
                answer: a + b,
            }
        }
        1 => {
            let a = picker.in_range(5, 20);
            let b = picker.in_range(5, 15);
            let (hi, lo) = ordered(a, b);
            MathChallenge {
                question: format!("{hi} - {lo}"),
                answer: hi - lo,
            }
        }
        _ => {
            let a = picker.in_range(2, 8);
            let b = picker.in_range(2, 8);
            MathChallenge {
                question: format!("{a} * {b}"),
                answer: a * b,
            }
        }
    }
}

fn hard(picker: &mut Picker) -> MathChallenge {
    match picker.pick(3) {
        0 => {
            // Two-step plus/minus chain, evaluated left to right.
            let a = picker.in_range(10, 30);
            let b = picker.in_range(5, 20);
            let c = picker.in_range(5, 15);

            let (first, intermediate) = if picker.coin() {
                (format!("{a} + {b}"), a + b)
            } else {
                let (hi, lo) = ordered(a, b);
                (format!("{hi} - {lo}"), hi - lo)
            };

            // Subtracting the final term is only offered when it stays
            // non-negative.
            if picker.coin() && intermediate >= c {
                MathChallenge {
                    question: format!("{first} - {c}"),
                    answer: intermediate - c,
                }
            } else {
                MathChallenge {
                    question: format!("{first} + {c}"),
                    answer: intermediate + c,
                }
            }
        }
        1 => {
            // Product with an offset. Multiplication binds first, so
            // the flipped rendering needs no parentheses.
            let a = picker.in_range(3, 9);
            let b = picker.in_range(3, 9);
            let c = picker.in_range(5, 20);
            let product = a * b;

            if picker.coin() {
                MathChallenge {
                    question: format!("{a} * {b} + {c}"),
                    answer: product + c,
                }
            } else if product >= c {
                MathChallenge {
                    question: format!("{a} * {b} - {c}"),
                    answer: product - c,
                }
            } else {
                MathChallenge {
                    question: format!("{c} - {a} * {b}"),
                    answer: c - product,
                }
            }
        }
        _ => {
            // Exact division: dividend is constructed from the answer.
            let divisor = picker.in_range(2, 8);
            let quotient = picker.in_range(3, 12);
            MathChallenge {
                question: format!("{} ÷ {divisor}", divisor * quotient),
                answer: quotient,
            }
        }
    }
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    (a.max(b), a.min(b))
}

/// Per-process entropy without a rand dependency.
///
/// RandomState is seeded from OS randomness at construction, so every
/// generated challenge draws from a fresh sequence. Modulo bias is
/// negligible for the single- and double-digit spans used here.
struct Picker {
    state: RandomState,
    step: u64,
}

impl Picker {
    fn new() -> Self {
        Self {
            state: RandomState::new(),
            step: 0,
        }
    }

    fn next(&mut self) -> u64 {
        let mut hasher = self.state.build_hasher();
        hasher.write_u64(self.step);
        self.step = self.step.wrapping_add(1);
        hasher.finish()
    }

    /// Pick from [min, max], inclusive on both ends.
    fn in_range(&mut self, min: i64, max: i64) -> i64 {
        let span = (max - min + 1) as u64;
        min + (self.next() % span) as i64
    }

    fn pick(&mut self, choices: u64) -> u64 {
        self.next() % choices
    }

    fn coin(&mut self) -> bool {
        self.next() % 2 == 0
    }
}
