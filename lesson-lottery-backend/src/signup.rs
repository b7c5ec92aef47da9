use lesson_lottery_store::models::Candidate;
use lesson_lottery_store::Store;
use tracing::info;

use crate::error::LotteryError;
use crate::lottery::Transaction;

/// Adds `candidate` to the signup list. The caller has already checked that
/// the window is open.
pub fn register<S: Store>(
    transaction: &mut Transaction<'_, S>,
    candidate: Candidate,
) -> Result<Candidate, LotteryError> {
    let candidate = Candidate::new(
        candidate.first_name.trim(),
        candidate.last_name.trim(),
        &candidate.email,
    );
    if !transaction.config().allows_email(&candidate.email) {
        return Err(LotteryError::DisallowedDomain {
            email: candidate.email,
        });
    }

    let mut signups = transaction.signups()?;
    if signups.contains(&candidate.email) {
        return Err(LotteryError::DuplicateEmail {
            email: candidate.email,
        });
    }
    signups.signups.push(candidate.clone());
    transaction.save_signups(&signups)?;
    info!("{} signed up", candidate.email);
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use lesson_lottery_store::models::Candidate;

    use crate::error::LotteryError;
    use crate::phase::Phase;
    use crate::test_utils::{lottery, SIGNUP_OPEN, WINDOW_CLOSED};

    #[test]
    fn registration_normalizes_the_candidate() {
        let lottery = lottery(SIGNUP_OPEN);
        let view = lottery
            .view_or_register(Some(Candidate {
                first_name: " Ana ".to_owned(),
                last_name: "Novak".to_owned(),
                email: " Ana.Novak@EXAMPLE.org".to_owned(),
            }))
            .unwrap();
        assert_eq!(view.phase, Phase::SignupOpen);
        assert_eq!(
            view.registered,
            Some(Candidate::new("Ana", "Novak", "ana.novak@example.org"))
        );
    }

    #[test]
    fn duplicates_are_rejected_case_insensitively() {
        let lottery = lottery(SIGNUP_OPEN);
        lottery
            .view_or_register(Some(Candidate::new("Ana", "Novak", "ana@example.org")))
            .unwrap();
        let err = lottery
            .view_or_register(Some(Candidate::new("Ana", "N.", "ANA@example.org")))
            .unwrap_err();
        assert!(matches!(err, LotteryError::DuplicateEmail { email } if email == "ana@example.org"));
        let signups = lottery.transaction(|transaction| transaction.signups()).unwrap();
        assert_eq!(signups.signups.len(), 1);
    }

    #[test]
    fn foreign_domains_are_rejected() {
        let lottery = lottery(SIGNUP_OPEN);
        for email in ["ana@example.com", "ana@notexample.org", "example.org"] {
            let err = lottery
                .view_or_register(Some(Candidate::new("Ana", "Novak", email)))
                .unwrap_err();
            assert!(matches!(err, LotteryError::DisallowedDomain { .. }), "{email}");
        }
        let signups = lottery.transaction(|transaction| transaction.signups()).unwrap();
        assert!(signups.signups.is_empty());
    }

    #[test]
    fn signups_outside_the_window_are_ignored() {
        let lottery = lottery(WINDOW_CLOSED);
        let view = lottery
            .view_or_register(Some(Candidate::new("Ana", "Novak", "ana@example.org")))
            .unwrap();
        assert_eq!(view.registered, None);
        assert_eq!(view.chosen, Some(vec![]));
    }
}
