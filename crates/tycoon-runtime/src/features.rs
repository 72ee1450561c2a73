//! Feature unlock gate.

use crate::error::Rejection;
use tycoon_core::{Difficulty, Feature, GameState};

/// Add `feature` to the unlocked set; re-unlocking is rejected without change.
pub fn unlock_feature(state: &mut GameState, feature: Feature) -> Result<(), Rejection> {
    if !state.unlocked_features.insert(feature) {
        return Err(Rejection::AlreadyUnlocked(feature));
    }
    Ok(())
}

/// Unlocked, and so is every feature it is nested under.
pub fn is_available(state: &GameState, feature: Feature) -> bool {
    state.is_unlocked(feature) && feature.parent().map_or(true, |p| is_available(state, p))
}

pub fn require(state: &GameState, feature: Feature) -> Result<(), Rejection> {
    if let Some(parent) = feature.parent() {
        require(state, parent)?;
    }
    if !state.is_unlocked(feature) {
        return Err(Rejection::FeatureLocked(feature));
    }
    Ok(())
}

pub fn set_difficulty(state: &mut GameState, difficulty: Difficulty) -> Result<(), Rejection> {
    require(state, Feature::Difficulty)?;
    state.difficulty = difficulty;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_requires_unlock() {
        let mut s = GameState::default();
        let hard = Difficulty {
            upper: true,
            numbers: true,
            symbols: false,
        };
        assert_eq!(
            set_difficulty(&mut s, hard),
            Err(Rejection::FeatureLocked(Feature::Difficulty))
        );
        assert!(s.difficulty.is_plain());
        unlock_feature(&mut s, Feature::Difficulty).unwrap();
        set_difficulty(&mut s, hard).unwrap();
        assert_eq!(s.difficulty, hard);
    }

    #[test]
    fn unlock_is_idempotent() {
        let mut s = GameState::default();
        unlock_feature(&mut s, Feature::TypingTest).unwrap();
        let before = s.clone();
        assert_eq!(
            unlock_feature(&mut s, Feature::TypingTest),
            Err(Rejection::AlreadyUnlocked(Feature::TypingTest))
        );
        assert_eq!(s, before);
    }

    #[test]
    fn marathon_nested_under_typing_test() {
        let mut s = GameState::default();
        unlock_feature(&mut s, Feature::MarathonMode).unwrap();
        assert!(!is_available(&s, Feature::MarathonMode));
        assert_eq!(
            require(&s, Feature::MarathonMode),
            Err(Rejection::FeatureLocked(Feature::TypingTest))
        );
        unlock_feature(&mut s, Feature::TypingTest).unwrap();
        assert!(is_available(&s, Feature::MarathonMode));
        assert!(require(&s, Feature::MarathonMode).is_ok());
    }
}
