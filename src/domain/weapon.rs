// Participants, weapons and the rule table that decides a round.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Local,
    Other,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Local => Player::Other,
            Player::Other => Player::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weapon {
    Rock,
    Paper,
    Scissors,
}

impl Weapon {
    pub const ALL: [Weapon; 3] = [Weapon::Rock, Weapon::Paper, Weapon::Scissors];

    /// The weapon this one defeats.
    pub fn beats(self) -> Weapon {
        match self {
            Weapon::Rock => Weapon::Scissors,
            Weapon::Paper => Weapon::Rock,
            Weapon::Scissors => Weapon::Paper,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundResult {
    LocalWin,
    OtherWin,
    Draw,
}

impl RoundResult {
    /// Same round seen from the other seat.
    pub fn flipped(self) -> Self {
        match self {
            RoundResult::LocalWin => RoundResult::OtherWin,
            RoundResult::OtherWin => RoundResult::LocalWin,
            RoundResult::Draw => RoundResult::Draw,
        }
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            RoundResult::LocalWin => Some(Player::Local),
            RoundResult::OtherWin => Some(Player::Other),
            RoundResult::Draw => None,
        }
    }
}

/// Decides a round where both players committed a weapon.
pub fn resolve(local: Weapon, other: Weapon) -> RoundResult {
    if local == other {
        RoundResult::Draw
    } else if local.beats() == other {
        RoundResult::LocalWin
    } else {
        RoundResult::OtherWin
    }
}
