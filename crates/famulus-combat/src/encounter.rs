//! The encounter controller: the round-by-round state machine.
//!
//! Each round runs through these phases:
//!
//! 1. **Deciding** -- poll continuation, advance the round counter,
//!    resolve the policy token through the gates into a concrete
//!    [`CombatAction`].
//! 2. **Submitted** -- post the round's form to the encounter endpoint
//!    and block on the raw response.
//! 3. **RoundResolved** -- pay the resolved action's deferred cost
//!    (mana, items, modifier deltas), then check termination.
//!
//! The loop re-enters Deciding until the response stops showing the
//! encounter page (`Terminated`), the action resolves to none while
//! the page is still served (`Aborted`, hand-back), or a `consult`
//! token hands the remaining rounds to an external handler
//! (`Delegated` -- a cooperative exit, not an error).

use tracing::{debug, info, warn};

use famulus_ledger::Ledger;
use famulus_types::{
    ActionToken, Bestiary, CharacterSheet, CombatAction, CombatSettings, ENCOUNTER_ENDPOINT,
    GameData, GameService, Session, Severity, shows_encounter,
};

use crate::error::CombatError;
use crate::policy;
use crate::threat::{self, Weakening};

/// Round counter sentinel for an encounter that was already underway
/// when the controller attached; the first-round rule must never fire
/// for such an encounter.
const IN_PROGRESS_ROUND: i32 = -100;

/// Distinct phases of the encounter state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterState {
    /// No round has started yet.
    Init,
    /// Choosing this round's action.
    Deciding,
    /// The round's form has been posted; awaiting the response.
    Submitted,
    /// The response has been consumed and costs paid.
    RoundResolved,
    /// The encounter page is no longer being served.
    Terminated,
    /// The run stopped while the encounter page was still served.
    Aborted,
    /// An external handler owns the remaining rounds.
    Delegated,
}

/// One multi-round interaction against a single opponent.
///
/// Created when the first round starts, mutated every round, and
/// discarded once termination is detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encounter {
    /// Normalized opponent lookup key. Empty when the opponent is not
    /// yet known; an empty key matches no bestiary entry and no rare
    /// list entry.
    pub opponent_key: String,
    /// Round counter. Starts at 0 for a fresh encounter or at a
    /// negative sentinel for one already in progress; strictly
    /// increases by 1 per round either way.
    pub round: i32,
    /// Cumulative offense modifier, adjusted as skill costs are paid.
    pub offense_modifier: i32,
    /// Cumulative defense modifier, adjusted as skill costs are paid.
    pub defense_modifier: i32,
}

impl Encounter {
    /// Start a fresh encounter against the given opponent.
    pub fn fresh(opponent: &str) -> Self {
        Self {
            opponent_key: Bestiary::encounter_key(opponent),
            round: 0,
            offense_modifier: 0,
            defense_modifier: 0,
        }
    }

    /// Attach to an encounter that is already underway (e.g. started
    /// in the browser). The opening-round rule never applies.
    pub fn in_progress(opponent: &str) -> Self {
        Self {
            round: IN_PROGRESS_ROUND,
            ..Self::fresh(opponent)
        }
    }
}

/// How an encounter run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterOutcome {
    /// The encounter page stopped being served after a round.
    Completed {
        /// Adventures consumed by the encounter (always 1 here: the
        /// page going away is what consumes the adventure).
        adventures_used: u32,
    },
    /// Termination coincided with zero hit points.
    Defeated,
    /// A `consult` token handed control to an external handler, which
    /// owns the remaining rounds.
    Delegated {
        /// Name of the external round handler.
        handler: String,
        /// The round the handler takes over at.
        round: i32,
        /// The opponent lookup key.
        opponent_key: String,
        /// The latest raw response text, for the handler to inspect.
        page: String,
    },
    /// The action resolved to none while the encounter page was still
    /// being served; the encounter must be finished manually.
    HandedBack {
        /// The raw page for the pass-through view.
        page: String,
    },
    /// Continuation was already denied before a round started.
    Unwound,
}

/// Drives one encounter to termination.
pub struct EncounterController<'a> {
    settings: &'a CombatSettings,
    data: &'a GameData,
    encounter: Encounter,
    state: EncounterState,
    rare_warned: bool,
    last_response: String,
}

impl<'a> EncounterController<'a> {
    /// Create a controller for the given encounter.
    pub const fn new(
        settings: &'a CombatSettings,
        data: &'a GameData,
        encounter: Encounter,
    ) -> Self {
        Self {
            settings,
            data,
            encounter,
            state: EncounterState::Init,
            rare_warned: false,
            last_response: String::new(),
        }
    }

    /// The current state machine phase.
    pub const fn state(&self) -> EncounterState {
        self.state
    }

    /// The encounter being driven.
    pub const fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// The latest raw response text.
    pub fn last_response(&self) -> &str {
        &self.last_response
    }

    /// Adventures consumed so far: 0 while the latest response still
    /// shows the encounter page (or nothing was submitted), else 1.
    pub fn adventures_used(&self) -> u32 {
        if self.last_response.is_empty() || shows_encounter(&self.last_response) {
            0
        } else {
            1
        }
    }

    /// Run rounds until the encounter terminates, is aborted, or is
    /// delegated.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError`] only for service transport failures and
    /// ledger inconsistencies; every policy-level problem is recovered
    /// by falling back to Attack or surfacing an outcome.
    pub fn run(
        &mut self,
        session: &mut Session,
        service: &mut dyn GameService,
        ledger: &mut Ledger,
        sheet: &mut CharacterSheet,
    ) -> Result<EncounterOutcome, CombatError> {
        loop {
            if !session.permits_continue() {
                self.state = EncounterState::Aborted;
                return Ok(EncounterOutcome::Unwound);
            }

            self.state = EncounterState::Deciding;
            self.encounter.round = self.encounter.round.saturating_add(1);
            let action = self.decide(session, ledger, sheet);
            debug!(
                round = self.encounter.round,
                opponent = %self.encounter.opponent_key,
                ?action,
                "round decided"
            );

            if let CombatAction::Delegate { handler } = action {
                // The external handler owns every round from here on.
                self.state = EncounterState::Delegated;
                info!(handler, round = self.encounter.round, "delegating encounter");
                return Ok(EncounterOutcome::Delegated {
                    handler,
                    round: self.encounter.round,
                    opponent_key: self.encounter.opponent_key.clone(),
                    page: self.last_response.clone(),
                });
            }

            let fields = self.form_fields(&action, session);
            self.state = EncounterState::Submitted;
            let response = service.submit(ENCOUNTER_ENDPOINT, &fields)?;

            self.pay_action_cost(&action, ledger, sheet)?;
            self.last_response = response;
            self.state = EncounterState::RoundResolved;

            let terminated = !shows_encounter(&self.last_response);

            if terminated && sheet.current_hp == 0 {
                session.notify(Severity::Error, "You were defeated!");
                self.state = EncounterState::Terminated;
                return Ok(EncounterOutcome::Defeated);
            }

            if terminated {
                session.notify(Severity::Abort, "Battle completed.");
                self.state = EncounterState::Terminated;
                return Ok(EncounterOutcome::Completed { adventures_used: 1 });
            }

            if matches!(action, CombatAction::Abort) || !session.permits_continue() {
                let message = if session.is_authenticated() {
                    // The pass-through view carries the page itself.
                    "You're on your own, partner."
                } else {
                    "Please finish your battle in-browser first."
                };
                session.notify(Severity::Abort, message);
                self.state = EncounterState::Aborted;
                return Ok(EncounterOutcome::HandedBack {
                    page: self.last_response.clone(),
                });
            }
        }
    }

    /// Resolve this round's action from policy output and the gates.
    fn decide(
        &mut self,
        session: &mut Session,
        ledger: &Ledger,
        sheet: &CharacterSheet,
    ) -> CombatAction {
        let round = self.encounter.round;

        // Rare-opponent advisory, raised once per encounter. The
        // notice clears continuation, but the current round still
        // resolves and submits.
        if session.is_authenticated() && !self.rare_warned && !self.encounter.opponent_key.is_empty()
        {
            let matched = self
                .settings
                .rare_opponents
                .iter()
                .find(|rare| self.encounter.opponent_key.contains(rare.as_str()));
            if let Some(rare) = matched {
                self.rare_warned = true;
                session.notify(
                    Severity::Abort,
                    format!("You have encountered the {rare}."),
                );
            }
        }

        // The opening round of a fresh encounter carries no extra
        // parameters; the service rule leaves no room for policy.
        let token = if round == 1 {
            ActionToken::Attack
        } else {
            policy::proposed_token(
                self.settings,
                session.credential(),
                &self.encounter.opponent_key,
                round,
            )
        };

        // Consult delegation bypasses every gate, including the halt.
        if let ActionToken::Consult(handler) = token {
            return CombatAction::Delegate { handler };
        }

        // Delevel resolves through the threat resolver first.
        let token = if token == ActionToken::Delevel {
            match threat::weakening_action(
                self.data.opponents.profile(&self.encounter.opponent_key),
                sheet,
                &self.data.skills,
                self.encounter.offense_modifier,
                self.encounter.defense_modifier,
            ) {
                Weakening::Unnecessary => ActionToken::Attack,
                Weakening::Skill(skill) => ActionToken::Skill(skill),
                Weakening::NoSafeAction => {
                    warn!(
                        opponent = %self.encounter.opponent_key,
                        "no safe weakening action, aborting"
                    );
                    ActionToken::Abort
                }
            }
        } else {
            token
        };

        // Gate 1: explicit abort, or continuation already denied.
        if token == ActionToken::Abort || !session.permits_continue() {
            return CombatAction::Abort;
        }

        // Hit point halt: at or below the threshold, the round is
        // abandoned no matter what the policy proposed.
        let halt_tolerance = self.halt_tolerance(sheet);
        if halt_tolerance > 0 && sheet.current_hp <= halt_tolerance {
            info!(
                current_hp = sheet.current_hp,
                halt_tolerance, "hit points at or below halt threshold"
            );
            return CombatAction::Abort;
        }

        match token {
            ActionToken::Attack => CombatAction::Attack,
            ActionToken::Flee => CombatAction::Flee,
            ActionToken::Item(item) => {
                let held = ledger.quantity(item);
                // Gate 2: an item the ledger does not hold.
                if held == 0 {
                    warn!(%item, "item not held, falling back to attack");
                    return CombatAction::Attack;
                }
                let can_dual_wield = self
                    .data
                    .skills
                    .dual_wield
                    .is_some_and(|skill| sheet.knows(skill));
                let second = (can_dual_wield && held >= 2).then_some(item);
                CombatAction::UseItem { item, second }
            }
            ActionToken::Skill(skill) => {
                // Gate 3: mana, enforced only under an authenticated
                // session.
                let cost = self.data.skills.mp_cost(skill);
                if session.is_authenticated() && sheet.current_mp < cost {
                    warn!(%skill, cost, current_mp = sheet.current_mp, "cannot afford skill");
                    return CombatAction::Attack;
                }
                // Gate 4: the skill must be in the known-abilities
                // lookup and actually known to the actor.
                if self.data.skills.get(skill).is_none() || !sheet.knows(skill) {
                    warn!(%skill, "skill unknown, falling back to attack");
                    return CombatAction::Attack;
                }
                CombatAction::UseSkill(skill)
            }
            ActionToken::Unrecognized(raw) => {
                warn!(token = raw, "unrecognized action token, falling back to attack");
                CombatAction::Attack
            }
            // A custom table that resolves to `custom` again, or a
            // delevel that re-resolved: nothing sensible remains but
            // the safe default.
            ActionToken::Custom | ActionToken::Delevel => CombatAction::Attack,
            // Handled above.
            ActionToken::Abort | ActionToken::Consult(_) => CombatAction::Abort,
        }
    }

    /// The hit point count at or below which rounds are abandoned.
    fn halt_tolerance(&self, sheet: &CharacterSheet) -> u32 {
        // Hit point totals sit far below f32 precision limits, and the
        // truncation clamps a negative fraction to zero.
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let tolerance = (self.settings.halt_fraction * sheet.maximum_hp as f32) as u32;
        tolerance
    }

    /// Build the form fields for a resolved action.
    ///
    /// The opening round of a fresh encounter submits no action field,
    /// and an abandoned round posts a bare form (the response tells us
    /// whether the encounter is even still being served).
    fn form_fields(&self, action: &CombatAction, session: &Session) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = Vec::new();
        if let Some(credential) = session.credential() {
            fields.push((String::from("pwd"), String::from(credential)));
        }

        match action {
            CombatAction::Attack => {
                if self.encounter.round != 1 {
                    fields.push((String::from("action"), String::from("attack")));
                }
            }
            CombatAction::Flee => {
                fields.push((String::from("action"), String::from("runaway")));
            }
            CombatAction::UseItem { item, second } => {
                fields.push((String::from("action"), String::from("useitem")));
                fields.push((String::from("whichitem"), item.to_string()));
                if let Some(second) = second {
                    fields.push((String::from("whichitem2"), second.to_string()));
                }
            }
            CombatAction::UseSkill(skill) => {
                fields.push((String::from("action"), String::from("skill")));
                fields.push((String::from("whichskill"), skill.to_string()));
            }
            CombatAction::Abort | CombatAction::Delegate { .. } => {}
        }

        fields
    }

    /// Pay the round's deferred cost once the response is in.
    ///
    /// Skills debit mana and apply their modifier deltas from the
    /// skill table; items are decremented unless configured free to
    /// use. Attack, flight, and abandoned rounds cost nothing.
    fn pay_action_cost(
        &mut self,
        action: &CombatAction,
        ledger: &mut Ledger,
        sheet: &mut CharacterSheet,
    ) -> Result<(), CombatError> {
        match action {
            CombatAction::Attack
            | CombatAction::Flee
            | CombatAction::Abort
            | CombatAction::Delegate { .. } => Ok(()),
            CombatAction::UseItem { item, second } => {
                if !self.data.items.is_no_cost(*item) {
                    ledger.debit(*item, 1, "combat item")?;
                }
                if let Some(second) = second
                    && !self.data.items.is_no_cost(*second)
                {
                    ledger.debit(*second, 1, "combat item")?;
                }
                Ok(())
            }
            CombatAction::UseSkill(skill) => {
                let Some(entry) = self.data.skills.get(*skill) else {
                    return Ok(());
                };
                self.encounter.offense_modifier = self
                    .encounter
                    .offense_modifier
                    .saturating_add(entry.offense_delta);
                self.encounter.defense_modifier = self
                    .encounter
                    .defense_modifier
                    .saturating_add(entry.defense_delta);
                sheet.spend_mp(entry.mp_cost);
                Ok(())
            }
        }
    }
}
