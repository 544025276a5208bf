//! Property-based tests for the transfer state machine
//!
//! Each case drives `transition` through a whole run, answering effects
//! from a scripted provider, and checks the invite-loop invariants.

use super::error::TransferError;
use super::state::*;
use super::*;
use crate::config::InvitePolicy;
use crate::journal::Level;
use crate::provider::Member;
use proptest::prelude::*;
use std::collections::VecDeque;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Privacy,
    RateLimited,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Invite(usize),
    Cooldown,
}

#[derive(Debug, Default)]
struct Trace {
    calls: Vec<Call>,
    closes: usize,
    levels: Vec<Level>,
    final_state: TransferState,
}

impl Trace {
    fn invites(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Invite(i) => Some(*i),
                Call::Cooldown => None,
            })
            .collect()
    }

    fn cooldowns(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Cooldown).count()
    }
}

fn inputs() -> TransferInputs {
    TransferInputs {
        api_id: "4242".to_string(),
        api_hash: "hash".to_string(),
        phone: "+15550100".to_string(),
        source_group: "source".to_string(),
        target_group: "target".to_string(),
    }
}

fn context(abort_on_unknown_error: bool) -> TransferContext {
    TransferContext::new(
        inputs(),
        InvitePolicy {
            cooldown: Duration::from_millis(1),
            abort_on_unknown_error,
        },
    )
}

fn members_from(handles: &[Option<String>]) -> Vec<Member> {
    handles
        .iter()
        .enumerate()
        .map(|(i, h)| Member::new(i64::try_from(i).unwrap(), h.as_deref()))
        .collect()
}

/// Run the machine to completion against scripted invite outcomes
fn simulate(handles: &[Option<String>], outcomes: &[Outcome], ctx: &TransferContext) -> Trace {
    let members = members_from(handles);
    let mut trace = Trace::default();
    let mut state = TransferState::Idle;
    let mut events = VecDeque::from([Event::Start]);

    while let Some(event) = events.pop_front() {
        let result = transition(&state, ctx, event).expect("valid transition");
        state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::Log { level, .. } => trace.levels.push(level),
                Effect::Authenticate { .. } => events.push_back(Event::Authenticated),
                Effect::FetchMembers { .. } => events.push_back(Event::MembersFetched {
                    members: members.clone(),
                }),
                Effect::Invite { member, .. } => {
                    let index = usize::try_from(member.id).unwrap();
                    trace.calls.push(Call::Invite(index));
                    events.push_back(match outcomes[index] {
                        Outcome::Ok => Event::InviteSucceeded,
                        Outcome::Privacy => Event::InviteFailed {
                            failure: InviteFailure::PrivacyRestricted,
                        },
                        Outcome::RateLimited => Event::InviteFailed {
                            failure: InviteFailure::RateLimited,
                        },
                        Outcome::Other => Event::InviteFailed {
                            failure: InviteFailure::Other("boom".to_string()),
                        },
                    });
                }
                Effect::Cooldown { .. } => {
                    trace.calls.push(Call::Cooldown);
                    events.push_back(Event::CooldownElapsed);
                }
                Effect::CloseSession => trace.closes += 1,
            }
        }
    }

    trace.final_state = state;
    trace
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_handle() -> impl Strategy<Value = Option<String>> {
    prop::option::weighted(0.8, "[a-z][a-z0-9_]{2,10}")
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        6 => Just(Outcome::Ok),
        2 => Just(Outcome::Privacy),
        1 => Just(Outcome::RateLimited),
        1 => Just(Outcome::Other),
    ]
}

fn arb_roster() -> impl Strategy<Value = (Vec<Option<String>>, Vec<Outcome>)> {
    (0usize..25).prop_flat_map(|n| {
        (
            prop::collection::vec(arb_handle(), n),
            prop::collection::vec(arb_outcome(), n),
        )
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn all_successes_invite_everyone_with_n_minus_one_cooldowns(
        handles in prop::collection::vec("[a-z]{3,8}".prop_map(Some), 1..20)
    ) {
        let n = handles.len();
        let outcomes = vec![Outcome::Ok; n];
        let trace = simulate(&handles, &outcomes, &context(true));

        prop_assert_eq!(trace.invites(), (0..n).collect::<Vec<_>>());
        prop_assert_eq!(trace.cooldowns(), n - 1);
        prop_assert_eq!(trace.calls.last(), Some(&Call::Invite(n - 1)));
        prop_assert_eq!(
            trace.final_state,
            TransferState::Done { result: TransferResult::completed(u32::try_from(n).unwrap()) }
        );
    }

    #[test]
    fn invite_loop_policy_holds((handles, outcomes) in arb_roster(), abort in any::<bool>()) {
        let trace = simulate(&handles, &outcomes, &context(abort));
        let invites = trace.invites();

        // Provider order, each member at most once, handle-less never invited
        prop_assert!(invites.windows(2).all(|w| w[0] < w[1]));
        for &i in &invites {
            prop_assert!(handles[i].is_some());
        }

        // Cooldown sits between two invites exactly when the first succeeded
        for (i, call) in trace.calls.iter().enumerate() {
            if let Call::Invite(m) = call {
                let followed_by_cooldown = trace.calls.get(i + 1) == Some(&Call::Cooldown);
                if trace.calls.get(i + 1).is_some() {
                    prop_assert_eq!(followed_by_cooldown, outcomes[*m] == Outcome::Ok);
                }
            }
        }
        prop_assert!(trace.calls.last() != Some(&Call::Cooldown));

        let successes = invites.iter().filter(|&&i| outcomes[i] == Outcome::Ok).count();
        let stop = invites.iter().position(|&i| {
            outcomes[i] == Outcome::RateLimited || (abort && outcomes[i] == Outcome::Other)
        });

        match &trace.final_state {
            TransferState::Done { result } => {
                prop_assert_eq!(result.invited_count as usize, successes);
                match result.termination_reason {
                    TerminationReason::RateLimited => {
                        let k = stop.expect("rate limit recorded");
                        prop_assert_eq!(outcomes[invites[k]], Outcome::RateLimited);
                        prop_assert_eq!(k, invites.len() - 1);
                    }
                    TerminationReason::None => {
                        prop_assert!(stop.is_none());
                        let expected: Vec<_> =
                            (0..handles.len()).filter(|&i| handles[i].is_some()).collect();
                        prop_assert_eq!(&invites, &expected);
                    }
                    TerminationReason::Cancelled => prop_assert!(false, "nobody cancelled"),
                }
            }
            TransferState::Aborted { error } => {
                prop_assert!(abort);
                prop_assert!(matches!(error, TransferError::UnknownInvite(_)));
                let k = stop.expect("fatal invite recorded");
                prop_assert_eq!(outcomes[invites[k]], Outcome::Other);
                prop_assert_eq!(k, invites.len() - 1);
            }
            other => prop_assert!(false, "run ended in {:?}", other),
        }

        prop_assert_eq!(trace.closes, 1);
    }

    #[test]
    fn empty_field_rejects_start(field in 0usize..5, blank in "[ \t]{0,3}") {
        let mut ctx = context(true);
        let target = match field {
            0 => &mut ctx.inputs.api_id,
            1 => &mut ctx.inputs.api_hash,
            2 => &mut ctx.inputs.phone,
            3 => &mut ctx.inputs.source_group,
            _ => &mut ctx.inputs.target_group,
        };
        *target = blank;

        let result = transition(&TransferState::Idle, &ctx, Event::Start);
        prop_assert!(matches!(result, Err(TransitionError::Input(_))));
    }

    #[test]
    fn log_levels_are_the_four_tags((handles, outcomes) in arb_roster()) {
        let trace = simulate(&handles, &outcomes, &context(true));
        prop_assert!(!trace.levels.is_empty());
        for level in trace.levels {
            prop_assert!(matches!(
                level,
                Level::Debug | Level::Info | Level::Warning | Level::Error
            ));
        }
    }
}

#[test]
fn rate_limit_at_kth_invite() {
    let handles: Vec<_> = (0..6).map(|i| Some(format!("user{i}"))).collect();
    let mut outcomes = vec![Outcome::Ok; 6];
    outcomes[3] = Outcome::RateLimited;

    let trace = simulate(&handles, &outcomes, &context(true));
    assert_eq!(trace.invites(), vec![0, 1, 2, 3]);
    assert_eq!(
        trace.final_state,
        TransferState::Done {
            result: TransferResult::stopped(3, TerminationReason::RateLimited)
        }
    );
}

#[test]
fn privacy_skip_inserts_no_cooldown() {
    let handles: Vec<_> = ["a", "b", "c"].iter().map(|h| Some((*h).to_string())).collect();
    let outcomes = [Outcome::Privacy, Outcome::Privacy, Outcome::Ok];

    let trace = simulate(&handles, &outcomes, &context(true));
    assert_eq!(
        trace.calls,
        vec![Call::Invite(0), Call::Invite(1), Call::Invite(2)]
    );
    assert_eq!(
        trace.final_state,
        TransferState::Done {
            result: TransferResult::completed(1)
        }
    );
}
