#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,   // exit 0
    Drift,   // exit 1
    Refusal, // exit 2
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Drift => 1,
            Self::Refusal => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "CLEAN",
            Self::Drift => "DRIFT",
            Self::Refusal => "REFUSAL",
        }
    }
}

pub fn exit_code(outcome: Outcome) -> u8 {
    outcome.exit_code()
}
