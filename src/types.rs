use std::fmt;

/// Which end of a read-pair a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mate {
    First,
    Second,
}

impl Mate {
    /// 1 or 2, as written in SAM flag terminology.
    pub fn number(self) -> u8 {
        match self {
            Mate::First => 1,
            Mate::Second => 2,
        }
    }

    pub fn other(self) -> Mate {
        match self {
            Mate::First => Mate::Second,
            Mate::Second => Mate::First,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => f.write_str("+"),
            Strand::Reverse => f.write_str("-"),
        }
    }
}
