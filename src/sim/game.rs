use anyhow::{anyhow, bail, ensure, Context, Result};
use itertools::Itertools;
use log::debug;

use crate::api::{ChroniclerGameUpdate, EventType, EventuallyEvent, GameByTeam, GameUpdate};
use crate::parse::{self, MildPitchType, ParsedFieldingOut, ParsedScore, ParsedSteal, ParsedStrikeout, UseFreeRefill};
use crate::roster::RosterSource;
use crate::sim::{PlayerState, show_batter_mod, show_pitcher_mod, show_runner_mod, Side, TeamState};
use crate::sim::team::first_truthy;

/// What kind of feed event the machine will accept next. The feed is totally
/// ordered, so anything out of phase means the reconstruction has diverged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Expecting {
    LetsGo,
    PlayBall,
    HalfInningStart,
    BatterUp,
    Pitch,
    InningEnd,
    GameEnd,
}

pub struct GameState {
    away: TeamState,
    home: TeamState,
    // Supersedes the lineup slot for the current at-bat; the lineup itself
    // is never touched
    haunter: Option<PlayerState>,
    expecting: Expecting,
    // None means the last out came without a snapshot to check against
    expects_reverberate_away: Option<bool>,
    expects_reverberate_home: Option<bool>,
    game_update: GameUpdate,
}

impl GameState {
    pub fn new(updates: &[ChroniclerGameUpdate], roster: &dyn RosterSource) -> Result<GameState> {
        // Updates with play count 0 have the wrong timestamp
        let at = updates.iter()
            .find(|u| u.data.play_count > 0)
            .context("No bootstrap update has a nonzero play count")?
            .timestamp;

        let away = TeamState::from_updates(updates, at, Side::Away, roster)?;
        let home = TeamState::from_updates(updates, at, Side::Home, roster)?;

        let first = &updates.first().context("No bootstrap updates")?.data;
        let game_update = GameUpdate {
            id: first.id,
            day: first.day,
            phase: 2,
            rules: first.rules,
            shame: false,
            inning: 0,
            season: first.season,
            weather: first.weather,
            outcomes: Vec::new(),
            finalized: false,
            game_start: false,
            play_count: 0,
            stadium_id: first.stadium_id,
            statsheet: first.statsheet,
            at_bat_balls: 0,
            at_bat_strikes: 0,
            last_update: String::new(),
            tournament: first.tournament,
            repeat_count: 0, // what
            score_ledger: String::new(),
            score_update: String::new(),
            series_index: first.series_index,
            series_length: first.series_length,
            terminology: first.terminology,
            top_of_inning: true,
            game_complete: false,
            is_postseason: first.is_postseason,
            is_title_match: first.is_title_match,
            base_runners: Vec::new(),
            base_runner_names: Vec::new(),
            base_runner_mods: Vec::new(),
            bases_occupied: Vec::new(),
            baserunner_count: 0,
            game_start_phase: -1,
            half_inning_outs: 0,
            new_inning_phase: -1,
            top_inning_score: 0.0,
            bottom_inning_score: 0.0,
            half_inning_score: 0.0,
            secret_baserunner: None,
            away: bootstrap_team(updates, Side::Away)?,
            home: bootstrap_team(updates, Side::Home)?,
        };

        Ok(GameState {
            away,
            home,
            haunter: None,
            expecting: Expecting::LetsGo,
            expects_reverberate_away: Some(false),
            expects_reverberate_home: Some(false),
            game_update,
        })
    }

    pub fn game_update(&self) -> &GameUpdate {
        &self.game_update
    }

    pub fn play_count(&self) -> i64 {
        self.game_update.play_count
    }

    /// Applies one feed event and returns the document the archive should
    /// hold after it. `snapshot` is the archived document for this same
    /// tick, when one exists; it settles the few things the feed doesn't
    /// say (non-forced advancement, double-play outs, reverberation).
    pub fn update(
        &mut self,
        event: &EventuallyEvent,
        snapshot: Option<&GameUpdate>,
        roster: &dyn RosterSource,
    ) -> Result<GameUpdate> {
        debug!("type {:?}: {}", event.r#type, event.description);

        // Always reset this, since scores are rare
        self.game_update.score_update.clear();

        match event.r#type {
            EventType::LetsGo => self.lets_go(event)?,
            // PlayBall emits a document that deviates from the running
            // state, so it bypasses the shared play count handling
            EventType::PlayBall => return self.play_ball(event),
            EventType::HalfInning => self.half_inning(event)?,
            EventType::StolenBase => self.stolen_base(event, snapshot)?,
            EventType::Walk => self.walk(event)?,
            EventType::Strikeout => self.strikeout(event, snapshot)?,
            EventType::FlyOut => self.fielding_out(event, snapshot)?,
            EventType::GroundOut => self.fielding_out(event, snapshot)?,
            EventType::HomeRun => self.home_run(event)?,
            EventType::Hit => self.hit(event, snapshot)?,
            EventType::GameEnd => self.game_end(event)?,
            EventType::BatterUp => self.batter_up(event, roster)?,
            EventType::Strike => self.strike(event)?,
            EventType::Ball => self.ball(event)?,
            EventType::FoulBall => self.foul_ball(event)?,
            EventType::StrikeZapped => self.strike_zapped(event)?,
            EventType::MildPitch => self.mild_pitch(event)?,
            EventType::InningEnd => self.inning_end(event)?,
            EventType::CoffeeBean => self.coffee_bean(event)?,
            EventType::Blooddrain => self.blooddrain(event)?,
            EventType::PeanutFlavorText => self.no_state_change_pitch(event)?,
            EventType::SuperyummyText => self.no_state_change_batter_up(event)?,
        }

        self.game_update.play_count += 1;
        Ok(self.game_update.clone())
    }

    fn expect(&self, expected: Expecting) -> Result<()> {
        ensure!(self.expecting == expected,
                "Expected the next event during {:?}, but the machine is at {:?}",
                expected, self.expecting);
        Ok(())
    }

    fn batting_side(&self) -> Side {
        if self.game_update.top_of_inning { Side::Away } else { Side::Home }
    }

    fn fielding_side(&self) -> Side {
        if self.game_update.top_of_inning { Side::Home } else { Side::Away }
    }

    fn batting_team(&self) -> &TeamState {
        match self.batting_side() {
            Side::Away => &self.away,
            Side::Home => &self.home,
        }
    }

    fn batting_team_mut(&mut self) -> &mut TeamState {
        match self.batting_side() {
            Side::Away => &mut self.away,
            Side::Home => &mut self.home,
        }
    }

    fn fielding_team(&self) -> &TeamState {
        match self.fielding_side() {
            Side::Away => &self.away,
            Side::Home => &self.home,
        }
    }

    fn fielding_team_mut(&mut self) -> &mut TeamState {
        match self.fielding_side() {
            Side::Away => &mut self.away,
            Side::Home => &mut self.home,
        }
    }

    fn batter(&self) -> Result<PlayerState> {
        if let Some(haunter) = &self.haunter {
            return Ok(haunter.clone());
        }
        self.batting_team().current_batter().map(|p| p.clone())
    }

    fn reverberate(&self, side: Side) -> Option<bool> {
        match side {
            Side::Away => self.expects_reverberate_away,
            Side::Home => self.expects_reverberate_home,
        }
    }

    fn reverberate_mut(&mut self, side: Side) -> &mut Option<bool> {
        match side {
            Side::Away => &mut self.expects_reverberate_away,
            Side::Home => &mut self.expects_reverberate_home,
        }
    }

    fn lets_go(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::LetsGo)?;
        ensure!(event.description == "Let's Go!",
                "Unexpected description for LetsGo event: {:?}", event.description);
        self.expecting = Expecting::PlayBall;

        let gu = &mut self.game_update;
        gu.last_update = event.description.clone();
        gu.game_start = true;
        gu.phase = 1;
        gu.away.pitcher = Some(self.away.pitcher.id);
        gu.away.pitcher_name = self.away.pitcher.name.clone();
        gu.away.pitcher_mod = show_pitcher_mod(&self.away.pitcher);
        gu.away.team_batter_count = -1;
        gu.home.pitcher = Some(self.home.pitcher.id);
        gu.home.pitcher_name = self.home.pitcher.name.clone();
        gu.home.pitcher_mod = show_pitcher_mod(&self.home.pitcher);
        gu.home.team_batter_count = -1;

        Ok(())
    }

    fn play_ball(&mut self, event: &EventuallyEvent) -> Result<GameUpdate> {
        self.expect(Expecting::PlayBall)?;
        ensure!(event.description == "Play ball!",
                "Unexpected description for PlayBall event: {:?}", event.description);
        self.expecting = Expecting::HalfInningStart;

        let gu = &mut self.game_update;
        gu.phase = 2;
        gu.inning = -1;
        gu.last_update = event.description.clone();
        gu.top_of_inning = false;
        // This does double duty: the normal increment for the special game
        // update, which doesn't get an automatic increment, and an extra
        // increment which is needed for the stored game update, which does
        // also get an automatic increment
        gu.play_count += 1;

        // The archive blanks the pitchers for this one tick. That would be
        // backward progress for the running state, so the emitted document
        // deviates from it instead of mutating it.
        let mut special = gu.clone();
        special.away.pitcher = None;
        special.away.pitcher_name = String::new();
        special.away.pitcher_mod = String::new();
        special.home.pitcher = None;
        special.home.pitcher_name = String::new();
        special.home.pitcher_mod = String::new();
        special.home.team_batter_count = -1;

        Ok(special)
    }

    fn half_inning(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::HalfInningStart)?;

        let gu = &mut self.game_update;
        gu.phase = 6; // whatever that means
        if !gu.top_of_inning {
            // Copied from observed behavior; gameStartPhase jumps to 10 when
            // the first full inning begins, then counts up per inning
            if gu.inning == -1 {
                gu.game_start_phase = 10;
            } else {
                gu.game_start_phase += 1;
            }

            gu.inning += 1;
        }

        gu.top_of_inning = !gu.top_of_inning;
        gu.half_inning_score = 0.0;

        let top_or_bottom = if self.game_update.top_of_inning { "Top" } else { "Bottom" };
        let team_name = &self.batting_side().of(&self.game_update).team_name;
        let description = format!("{} of {}, {} batting.",
                                  top_or_bottom, self.game_update.inning + 1, team_name);
        ensure!(event.description == description,
                "Expected HalfInning description {:?} but got {:?}",
                description, event.description);
        self.game_update.last_update = description;

        self.expecting = Expecting::BatterUp;
        Ok(())
    }

    fn batter_up(&mut self, event: &EventuallyEvent, roster: &dyn RosterSource) -> Result<()> {
        self.expect(Expecting::BatterUp)?;

        let parsed = parse::parse_batter_up(&event.description)?;

        let side = self.batting_side();
        if self.reverberate(side) != Some(true) {
            self.batting_team_mut().advance_batter();
        }

        if let Some(inhabiting) = &parsed.inhabiting {
            let haunter_id = event.player_tags.first()
                .context("Inhabiting BatterUp event has no player tag for the haunter")?;
            let haunter = PlayerState::from_player(&roster.load_player(*haunter_id, event.created)?);
            ensure!(inhabiting.haunter_name == haunter.name,
                    "Haunter {:?} in the description is not {:?}", inhabiting.haunter_name, haunter.name);
            let haunted = self.batter()?;
            ensure!(inhabiting.haunted_name == haunted.name,
                    "Haunted batter {:?} in the description is not {:?}", inhabiting.haunted_name, haunted.name);
            self.haunter = Some(haunter);
        }

        let batter = self.batter()?;
        ensure!(self.batting_team().nickname == parsed.team_nickname,
                "BatterUp event is for the {} but the {} are batting",
                parsed.team_nickname, self.batting_team().nickname);
        ensure!(batter.name == parsed.batter_name,
                "BatterUp event is for {:?} but {:?} is due up", parsed.batter_name, batter.name);

        for item in &parsed.wielding {
            ensure!(batter.legacy_item.as_deref() == Some(*item),
                    "BatterUp event has {:?} wielding {:?} but their legacy item is {:?}",
                    batter.name, item, batter.legacy_item);
        }

        let by_team = side.of_mut(&mut self.game_update);
        by_team.batter = Some(batter.id);
        by_team.batter_name = batter.name.clone();
        by_team.batter_mod = show_batter_mod(&batter);
        by_team.team_batter_count += 1;
        self.game_update.last_update = event.description.clone();

        self.expecting = Expecting::Pitch;
        Ok(())
    }

    fn stolen_base(&mut self, event: &EventuallyEvent, snapshot: Option<&GameUpdate>) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        let parsed = parse::parse_steal(&event.description)?;
        let (runner_name, base) = match &parsed {
            ParsedSteal::StolenBase { runner_name, base, .. } => (*runner_name, *base),
            ParsedSteal::CaughtStealing { runner_name, base } => (*runner_name, *base),
        };
        // The runner must be one base shy of the base they tried for; you
        // can't steal to any other base with this event type
        let base_stolen = base as i64;
        let stealer_idx = self.game_update.bases_occupied.iter()
            .position(|&b| b == base_stolen - 1)
            .with_context(|| format!("No runner in position to steal {} base", base.name()))?;
        ensure!(self.game_update.base_runner_names[stealer_idx] == runner_name,
                "Expected {:?} to be stealing, not {:?}",
                self.game_update.base_runner_names[stealer_idx], runner_name);

        let mut runs_scored = 0.0;
        match &parsed {
            ParsedSteal::StolenBase { blaserunning, free_refills, .. } => {
                // Must advance the stealer before any scoring or the indices
                // are off
                self.game_update.bases_occupied[stealer_idx] += 1;
                let mut expects_extras = false;

                if let Some(blaserunner_name) = blaserunning {
                    ensure!(blaserunner_name == &runner_name,
                            "Blaserunning credit went to {:?}, not the stealer {:?}",
                            blaserunner_name, runner_name);
                    runs_scored += self.score_runs(0.2);
                    expects_extras = true;
                }

                if base_stolen + 1 == self.batting_side().of(&self.game_update).bases {
                    runs_scored += self.score_player(runner_name)?;
                    expects_extras = true;
                }

                if expects_extras {
                    self.apply_scoring_extras(free_refills)?;
                } else {
                    ensure!(free_refills.is_empty(),
                            "StolenBase event has free refills but nobody scored");
                }
            }
            ParsedSteal::CaughtStealing { .. } => {
                self.remove_baserunner_by_index(stealer_idx);
                self.update_out(snapshot, false)?;
            }
        }

        self.record_runs(runs_scored);
        self.game_update.last_update = event.description.clone();
        Ok(())
    }

    fn walk(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        let parsed = parse::parse_walk(&event.description)?;
        let batter = self.batter()?;
        ensure!(parsed.batter_name == batter.name,
                "Walk event is for {:?} but {:?} is at bat", parsed.batter_name, batter.name);

        self.walk_generic(&batter);
        self.update_scores(&parsed.scores)?;

        self.game_update.last_update = event.description.clone();
        Ok(())
    }

    fn walk_generic(&mut self, batter: &PlayerState) {
        self.player_to_base(batter, 0); // Until the Beams get here
        self.end_atbat();
    }

    fn strikeout(&mut self, event: &EventuallyEvent, snapshot: Option<&GameUpdate>) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        let parsed = parse::parse_strikeout(&event.description)?;
        let batter = self.batter()?;
        let team_strikes = self.batting_side().of(&self.game_update).strikes;
        match parsed {
            ParsedStrikeout::Strikeout { batter_name, .. } => {
                ensure!(batter.name == batter_name,
                        "Strikeout event is for {:?} but {:?} is at bat", batter_name, batter.name);

                // They have to be one strike away from an out
                ensure!(self.game_update.at_bat_strikes + 1 == team_strikes,
                        "Strikeout event arrived at {} strikes of {}",
                        self.game_update.at_bat_strikes, team_strikes);
            }
            ParsedStrikeout::Charm { pitcher_name, batter_name, batter_name2, num_swings } => {
                ensure!(pitcher_name == self.fielding_team().pitcher.name,
                        "Charm strikeout credited to {:?}, not the pitcher {:?}",
                        pitcher_name, self.fielding_team().pitcher.name);
                ensure!(batter_name == batter.name && batter_name2 == batter.name,
                        "Charm strikeout is for {:?}/{:?} but {:?} is at bat",
                        batter_name, batter_name2, batter.name);

                // A charmed batter swings away their whole strike budget
                ensure!(num_swings == team_strikes,
                        "Charmed batter swung {} times with {} strikes configured",
                        num_swings, team_strikes);
            }
        }

        self.game_update.last_update = event.description.clone();

        self.update_out(snapshot, true)
    }

    // Ground outs and flyouts are different event types, but the logic is so
    // similar that it's easier to combine them
    fn fielding_out(&mut self, event: &EventuallyEvent, snapshot: Option<&GameUpdate>) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        let parsed = parse::parse_fielding_out(event.r#type, &event.description)?;
        let batter = self.batter()?;

        let (batter_name, scores) = match parsed {
            ParsedFieldingOut::Flyout { batter_name, fielder_name, scores }
            | ParsedFieldingOut::GroundOut { batter_name, fielder_name, scores } => {
                ensure!(self.fielding_team().lineup.iter().any(|defender| defender.name == fielder_name),
                        "Fielder {:?} is not in the fielding lineup", fielder_name);
                (batter_name, scores)
            }
            ParsedFieldingOut::DoublePlay { batter_name, scores } => {
                // The first out of a double play can't be the out that ends
                // the inning... right?
                self.game_update.half_inning_outs += 1;
                ensure!(self.game_update.half_inning_outs < self.batting_side().of(&self.game_update).outs,
                        "The first out of a double play ended the half-inning");

                // Scoring players have to come off the bases before we can
                // tell who got out
                self.update_scores(&scores)?;

                // The feed doesn't say which runner the second out erased.
                // Ask the snapshot, unless the inning is ending anyway (then
                // the snapshot's bases are already cleared).
                if self.game_update.half_inning_outs + 1 < self.batting_side().of(&self.game_update).outs {
                    let snapshot = snapshot
                        .context("A double play that leaves runners on needs a snapshot to identify the out")?;
                    let out_idx = self.game_update.base_runners.iter()
                        .enumerate()
                        .filter(|(_, id)| !snapshot.base_runners.contains(id))
                        .map(|(i, _)| i)
                        .exactly_one()
                        .map_err(|_| anyhow!("Expected exactly one runner missing from the double play snapshot"))?;
                    self.remove_baserunner_by_index(out_idx);
                }

                (batter_name, Vec::new())
            }
            ParsedFieldingOut::FieldersChoice { runner_out_name, base: _, scores, batter_name } => {
                // This will break when the same runner is on base twice.
                // Examine the parsed base to fix that.
                let runner_idx = self.game_update.base_runner_names.iter()
                    .position(|name| name.as_str() == runner_out_name)
                    .with_context(|| format!("Runner {:?} forced out is not on base", runner_out_name))?;
                self.remove_baserunner_by_index(runner_idx);
                // Where the batter actually ends up isn't knowable here; the
                // baserunner advancement correction fixes it up
                self.player_to_base(&batter, 0);
                (batter_name, scores)
            }
        };

        ensure!(batter_name == batter.name,
                "Fielding out is for {:?} but {:?} is at bat", batter_name, batter.name);

        self.update_scores(&scores)?;
        self.game_update.last_update = event.description.clone();

        self.update_out(snapshot, true)?;
        // This must be last or it errors when this event ends the half-inning
        self.maybe_advance_baserunners(snapshot)
    }

    fn hit(&mut self, event: &EventuallyEvent, snapshot: Option<&GameUpdate>) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        let parsed = parse::parse_hit(&event.description)?;
        let batter = self.batter()?;
        if let Some(heating_up_name) = parsed.heating_up {
            ensure!(heating_up_name == parsed.batter_name,
                    "Heating Up credited to {:?}, not the batter {:?}", heating_up_name, parsed.batter_name);
        }
        ensure!(parsed.batter_name == batter.name,
                "Hit event is for {:?} but {:?} is at bat", parsed.batter_name, batter.name);

        self.update_scores(&parsed.scores)?;

        self.game_update.last_update = event.description.clone();
        self.player_to_base(&batter, parsed.base as i64);
        self.end_atbat();
        // This must be last or it errors when this event ends the half-inning
        self.maybe_advance_baserunners(snapshot)
    }

    fn home_run(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        let parsed = parse::parse_home_run(&event.description)?;
        let batter = self.batter()?;
        ensure!(parsed.batter_name == batter.name,
                "HomeRun event is for {:?} but {:?} is at bat", parsed.batter_name, batter.name);

        self.apply_scoring_extras(&parsed.free_refills)?;

        // Remove baserunners only after the extras so the refiller search
        // still knows who was on base
        for _ in 0..parsed.num_scores - 1 {
            ensure!(self.game_update.baserunner_count > 0,
                    "A {}-run home run needs runners on base", parsed.num_scores);
            self.remove_baserunner_by_index(0);
        }

        // Home runs should clear the bases
        ensure!(self.game_update.base_runners.is_empty(),
                "Home run left runners on base");

        self.game_update.last_update = event.description.clone();

        let runs = parsed.num_scores as f64;
        self.score_runs(runs);
        self.record_runs(runs);
        self.end_atbat();
        Ok(())
    }

    fn mild_pitch(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        let parsed = parse::parse_mild_pitch(&event.description)?;
        ensure!(parsed.pitcher_name == self.fielding_team().pitcher.name,
                "Mild pitch thrown by {:?}, not the pitcher {:?}",
                parsed.pitcher_name, self.fielding_team().pitcher.name);

        match parsed.pitch {
            MildPitchType::Ball { balls, strikes } => {
                self.game_update.at_bat_balls += 1;
                ensure!(self.game_update.at_bat_balls == balls
                            && self.game_update.at_bat_strikes == strikes,
                        "Mild pitch count {}-{} does not match the at-bat count {}-{}",
                        balls, strikes, self.game_update.at_bat_balls, self.game_update.at_bat_strikes);
            }
            MildPitchType::Walk { batter_name } => {
                let batter = self.batter()?;
                ensure!(batter_name == batter.name,
                        "Mild pitch walked {:?} but {:?} is at bat", batter_name, batter.name);
                self.walk_generic(&batter);
            }
        }

        // Everything else should be a score
        self.update_scores(&parsed.scores)?;

        self.game_update.last_update = event.description.clone();
        Ok(())
    }

    fn ball(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        self.game_update.at_bat_balls += 1;
        self.check_count(event, &["Ball"])
    }

    fn strike(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        self.game_update.at_bat_strikes += 1;
        self.check_count(event, &["Strike, swinging", "Strike, looking", "Strike, flinching"])
    }

    fn foul_ball(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        // A foul with two strikes doesn't advance the count
        if self.game_update.at_bat_strikes + 1 < self.batting_side().of(&self.game_update).strikes {
            self.game_update.at_bat_strikes += 1;
        }

        self.check_count(event, &["Foul Ball"])
    }

    fn check_count(&mut self, event: &EventuallyEvent, text_options: &[&str]) -> Result<()> {
        let balls = self.game_update.at_bat_balls;
        let strikes = self.game_update.at_bat_strikes;
        for text in text_options {
            let description = format!("{}. {}-{}", text, balls, strikes);
            if event.description == description {
                self.game_update.last_update = description;
                return Ok(());
            }
        }
        bail!("Description {:?} does not match the {}-{} count",
              event.description, balls, strikes);
    }

    fn strike_zapped(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        let description = "The Electricity zaps a strike away!";
        ensure!(event.description == description,
                "Unexpected description for StrikeZapped event: {:?}", event.description);
        self.game_update.last_update = description.to_string();

        ensure!(self.game_update.at_bat_strikes > 0,
                "The Electricity zapped a strike that doesn't exist");
        self.game_update.at_bat_strikes -= 1;
        Ok(())
    }

    fn home_and_away_score_text(&self) -> (String, String) {
        let gu = &self.game_update;
        (format!("{} {}", self.home.nickname, gu.home.score),
         format!("{} {}", self.away.nickname, gu.away.score))
    }

    fn game_end(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::GameEnd)?;

        let (home_text, away_text) = self.home_and_away_score_text();
        let description = if self.game_update.home.score > self.game_update.away.score {
            format!("{}, {}", home_text, away_text)
        } else {
            format!("{}, {}", away_text, home_text)
        };
        ensure!(event.description == description,
                "Expected GameEnd description {:?} but got {:?}", description, event.description);
        self.game_update.last_update = description;

        self.game_update.finalized = true;
        self.game_update.game_complete = true;
        Ok(())
    }

    fn inning_end(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::InningEnd)?;

        let description = format!("Inning {} is now an Outing.", self.game_update.inning + 1);
        ensure!(event.description == description,
                "Expected InningEnd description {:?} but got {:?}", description, event.description);
        self.game_update.last_update = description;
        self.game_update.phase = 2;

        self.expecting = Expecting::HalfInningStart;
        Ok(())
    }

    fn blooddrain(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?; // we'll see if this holds

        let parsed = parse::parse_blooddrain(&event.description)?;
        ensure!(parsed.sipper_name == parsed.sipper_name2 && parsed.sipper_name == parsed.sipper_name3,
                "Siphon strike names {:?}/{:?}/{:?} disagree",
                parsed.sipper_name, parsed.sipper_name2, parsed.sipper_name3);

        self.game_update.at_bat_strikes += 1;
        // This can't be the strike that ends the at-bat... right?
        ensure!(self.game_update.at_bat_strikes < self.batting_side().of(&self.game_update).strikes,
                "A siphoned strike filled the count");

        self.game_update.last_update = event.description.clone();
        Ok(())
    }

    fn coffee_bean(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?; // we'll see if this holds

        let parsed = parse::parse_coffee_bean(&event.description)?;
        ensure!(parsed.player_name == parsed.player_name2,
                "Coffee bean names {:?}/{:?} disagree", parsed.player_name, parsed.player_name2);

        // Despite appearances the bean changes no displayed state
        self.game_update.last_update = event.description.clone();
        Ok(())
    }

    fn no_state_change_pitch(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::Pitch)?;

        // There is nothing to do but copy over the description
        self.game_update.last_update = event.description.clone();
        Ok(())
    }

    fn no_state_change_batter_up(&mut self, event: &EventuallyEvent) -> Result<()> {
        self.expect(Expecting::BatterUp)?;

        // There is nothing to do but copy over the description
        self.game_update.last_update = event.description.clone();
        Ok(())
    }

    fn update_scores(&mut self, scores: &[ParsedScore]) -> Result<()> {
        let mut runs_scored = 0.0;
        for score in scores {
            // Extras first, while the baserunner arrays are intact
            self.apply_scoring_extras(&score.free_refills)?;
            runs_scored += self.score_player(score.name)?;
        }
        self.record_runs(runs_scored);
        Ok(())
    }

    fn apply_scoring_extras(&mut self, extras: &[UseFreeRefill]) -> Result<()> {
        for refill in extras {
            ensure!(refill.name == refill.name2,
                    "Free refill names {:?}/{:?} disagree", refill.name, refill.name2);
            let name = refill.name;

            // A free refill can be spent by the batter or a baserunner or,
            // if the stars align, the pitcher
            let batter = self.batter()?;
            ensure!(name == batter.name
                        || name == self.fielding_team().pitcher.name
                        || self.game_update.base_runner_names.iter().any(|n| n.as_str() == name),
                    "{:?} used a free refill but isn't part of this play", name);

            self.game_update.half_inning_outs -= 1;

            if self.fielding_team().pitcher.name == name
                && self.fielding_team().pitcher.mods.contains("COFFEE_RALLY") {
                let side = self.fielding_side();
                self.fielding_team_mut().pitcher.mods.remove("COFFEE_RALLY");
                let displayed = show_pitcher_mod(&self.fielding_team().pitcher);
                side.of_mut(&mut self.game_update).pitcher_mod = displayed;
            } else {
                // If this fails with two candidates, two players share the
                // name and something else has to disambiguate them
                let refiller_idx = self.batting_team().lineup.iter()
                    .enumerate()
                    .filter(|(_, p)| p.name == name && p.mods.contains("COFFEE_RALLY"))
                    .map(|(i, _)| i)
                    .exactly_one()
                    .map_err(|_| anyhow!("Expected exactly one candidate for {:?}'s free refill", name))?;

                let refiller = &mut self.batting_team_mut().lineup[refiller_idx];
                refiller.mods.remove("COFFEE_RALLY");
                let refiller_id = refiller.id;
                let runner_mod = show_runner_mod(refiller);
                let batter_mod = show_batter_mod(refiller);

                // Clear the displayed mod anywhere this player shows up
                if batter.id == refiller_id {
                    let side = self.batting_side();
                    side.of_mut(&mut self.game_update).batter_mod = batter_mod;
                }
                let gu = &mut self.game_update;
                for (runner_idx, runner_id) in gu.base_runners.iter().enumerate() {
                    if *runner_id == refiller_id {
                        gu.base_runner_mods[runner_idx] = runner_mod.clone();
                    }
                }
            }
        }
        Ok(())
    }

    fn record_runs(&mut self, runs_scored: f64) {
        if runs_scored == 1.0 {
            self.game_update.score_update = "1 Run scored!".to_string();
        } else if runs_scored != 0.0 {
            self.game_update.score_update = format!("{} Runs scored!", runs_scored);
        }
    }

    fn score_player(&mut self, scoring_player_name: &str) -> Result<f64> {
        // You'd think the scoring player is always the 0th, but nope
        let index = self.game_update.base_runner_names.iter()
            .position(|name| name.as_str() == scoring_player_name)
            .with_context(|| format!("Scoring player {:?} is not on base", scoring_player_name))?;

        self.remove_baserunner_by_index(index);
        Ok(self.score_runs(1.0))
    }

    fn remove_baserunner_by_index(&mut self, list_index: usize) {
        let gu = &mut self.game_update;
        gu.base_runners.remove(list_index);
        gu.base_runner_names.remove(list_index);
        gu.base_runner_mods.remove(list_index);
        gu.bases_occupied.remove(list_index);
        gu.baserunner_count -= 1;
    }

    fn score_runs(&mut self, runs: f64) -> f64 {
        let side = self.batting_side();
        let gu = &mut self.game_update;
        side.of_mut(gu).score += runs;
        gu.half_inning_score += runs;
        if gu.top_of_inning {
            gu.top_inning_score += runs;
        } else {
            gu.bottom_inning_score += runs;
        }

        runs
    }

    fn player_to_base(&mut self, player: &PlayerState, base_num: i64) {
        let gu = &mut self.game_update;
        // First just shove the player on the base
        gu.base_runners.push(player.id);
        gu.base_runner_names.push(player.name.clone());
        gu.base_runner_mods.push(show_runner_mod(player));
        gu.bases_occupied.push(base_num);
        gu.baserunner_count += 1;

        // Then walk the bases back to front, pushing runners forward as
        // needed to keep the occupancy legal. Scored runners are not this
        // function's problem; they're parsed separately.
        let mut highest_occupied_base = -1;
        for runner_idx in (0..gu.bases_occupied.len()).rev() {
            if gu.bases_occupied[runner_idx] <= highest_occupied_base {
                gu.bases_occupied[runner_idx] = highest_occupied_base + 1;
            }
            highest_occupied_base = gu.bases_occupied[runner_idx];
        }
    }

    fn update_out(&mut self, snapshot: Option<&GameUpdate>, for_batter: bool) -> Result<()> {
        self.game_update.half_inning_outs += 1;

        let side = self.batting_side();
        if self.game_update.half_inning_outs >= side.of(&self.game_update).outs { // I see you, Crowvertime
            self.end_half_inning(for_batter);
        } else if for_batter {
            // Only end the at-bat if the out belongs to the batter. Which it
            // usually does, but not for e.g. caught stealing.
            self.end_atbat();
        }

        match snapshot {
            None => {
                // Reverberation status unknown
                *self.reverberate_mut(side) = None;
            }
            Some(snapshot) => {
                let tbc_diff = side.of(&self.game_update).team_batter_count
                    - side.of(snapshot).team_batter_count;
                if tbc_diff != 0 {
                    ensure!(tbc_diff == 1,
                            "Batter count is {} ahead of the snapshot", tbc_diff);
                    *self.reverberate_mut(side) = Some(true);
                    side.of_mut(&mut self.game_update).team_batter_count -= 1;
                } else {
                    *self.reverberate_mut(side) = Some(false);
                }
            }
        }

        Ok(())
    }

    fn end_atbat(&mut self) {
        let side = self.batting_side();
        let by_team = side.of_mut(&mut self.game_update);

        by_team.batter = None;
        by_team.batter_name = String::new();
        by_team.batter_mod = String::new();
        self.game_update.at_bat_balls = 0;
        self.game_update.at_bat_strikes = 0;

        self.haunter = None;
        self.expecting = Expecting::BatterUp;
    }

    fn end_half_inning(&mut self, for_batter: bool) {
        self.end_atbat();

        let gu = &mut self.game_update;
        gu.base_runners.clear();
        gu.base_runner_names.clear();
        gu.base_runner_mods.clear();
        gu.bases_occupied.clear();
        gu.baserunner_count = 0;

        gu.half_inning_outs = 0;
        gu.phase = 3;
        if !gu.top_of_inning {
            gu.top_inning_score = 0.0;
            gu.bottom_inning_score = 0.0;
            gu.half_inning_score = 0.0;
        }

        // If the half ends on an out that wasn't the batter's, the at-bat
        // doesn't count: the batter count rolls back and the same batter
        // leads off next half. Observably different from just not advancing
        // at the next batter-up.
        if !for_batter {
            let side = self.batting_side();
            side.of_mut(&mut self.game_update).team_batter_count -= 1;
            self.batting_team_mut().batter_index -= 1;
        }

        let gu = &self.game_update;
        let batting = self.batting_side().of(gu);
        let fielding = self.fielding_side().of(gu);
        if gu.inning >= 8 && batting.score < fielding.score {
            // The game ends after the 9th (1-indexed) if the team coming up
            // short was batting
            self.end_game();
        } else if gu.top_of_inning {
            self.expecting = Expecting::HalfInningStart;
        } else {
            self.expecting = Expecting::InningEnd;
        }
    }

    fn end_game(&mut self) {
        let gu = &mut self.game_update;
        gu.top_inning_score = 0.0;
        gu.bottom_inning_score = 0.0;
        gu.half_inning_score = 0.0;
        gu.phase = 7;

        self.expecting = Expecting::GameEnd;
    }

    fn maybe_advance_baserunners(&mut self, snapshot: Option<&GameUpdate>) -> Result<()> {
        // Baserunner advancement on outs and hits is one of the few things
        // that can't be reconstructed from the feed. Copy it over if we can.
        if let Some(snapshot) = snapshot {
            ensure!(self.game_update.bases_occupied.len() == snapshot.bases_occupied.len(),
                    "Snapshot has {} baserunners where the running state has {}",
                    snapshot.bases_occupied.len(), self.game_update.bases_occupied.len());
            self.game_update.bases_occupied = snapshot.bases_occupied.clone();
        }
        Ok(())
    }
}

fn bootstrap_config<T>(
    updates: &[ChroniclerGameUpdate],
    side: Side,
    field: &str,
    f: impl Fn(&GameByTeam) -> Option<T>,
) -> Result<T> {
    first_truthy(updates, |g| f(side.of(g)))
        .with_context(|| format!("No bootstrap update has {:?} {}", side, field))
}

fn bootstrap_team(updates: &[ChroniclerGameUpdate], side: Side) -> Result<GameByTeam> {
    Ok(GameByTeam {
        odds: bootstrap_config(updates, side, "odds", |t| (t.odds != 0.0).then(|| t.odds))?,
        outs: bootstrap_config(updates, side, "outs", |t| (t.outs != 0).then(|| t.outs))?,
        team: bootstrap_config(updates, side, "team", |t| (!t.team.is_nil()).then(|| t.team))?,
        balls: bootstrap_config(updates, side, "balls", |t| (t.balls != 0).then(|| t.balls))?,
        bases: bootstrap_config(updates, side, "bases", |t| (t.bases != 0).then(|| t.bases))?,
        score: 0.0,
        batter: None,
        pitcher: None,
        strikes: bootstrap_config(updates, side, "strikes", |t| (t.strikes != 0).then(|| t.strikes))?,
        team_name: bootstrap_config(updates, side, "teamName",
                                    |t| (!t.team_name.is_empty()).then(|| t.team_name.clone()))?,
        team_color: bootstrap_config(updates, side, "teamColor",
                                     |t| (!t.team_color.is_empty()).then(|| t.team_color.clone()))?,
        team_emoji: bootstrap_config(updates, side, "teamEmoji",
                                     |t| (!t.team_emoji.is_empty()).then(|| t.team_emoji.clone()))?,
        batter_mod: String::new(),
        batter_name: String::new(),
        pitcher_mod: String::new(),
        pitcher_name: String::new(),
        team_nickname: bootstrap_config(updates, side, "teamNickname",
                                        |t| (!t.team_nickname.is_empty()).then(|| t.team_nickname.clone()))?,
        team_batter_count: 0,
        team_secondary_color: bootstrap_config(updates, side, "teamSecondaryColor",
                                               |t| (!t.team_secondary_color.is_empty()).then(|| t.team_secondary_color.clone()))?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use crate::api::{ChroniclerGameUpdate, GameByTeam, GameUpdate};
    use crate::roster::{ChroniclerPlayer, StaticRoster, TeamRoster};

    pub const GAME_ID: Uuid = Uuid::from_u128(0x11);
    pub const AWAY_TEAM: Uuid = Uuid::from_u128(0xA0);
    pub const HOME_TEAM: Uuid = Uuid::from_u128(0xB0);
    pub const AWAY_PITCHER: Uuid = Uuid::from_u128(0xA1);
    pub const HOME_PITCHER: Uuid = Uuid::from_u128(0xB1);
    pub const HAUNTER: Uuid = Uuid::from_u128(0xC1);

    fn player(id: u128, name: &str, game_attr: &[&str]) -> ChroniclerPlayer {
        ChroniclerPlayer {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            perm_attr: Vec::new(),
            seas_attr: Vec::new(),
            game_attr: game_attr.iter().map(|m| m.to_string()).collect(),
            item_attr: Vec::new(),
            bat: None,
        }
    }

    pub fn fixture_roster() -> StaticRoster {
        let mut roster = StaticRoster::default();
        roster.teams.insert(AWAY_TEAM, TeamRoster {
            nickname: "Fridays".to_string(),
            lineup: vec![
                player(0xA2, "Jessica Telephone", &["COFFEE_RALLY"]),
                player(0xA3, "Nagomi Mcdaniel", &[]),
                player(0xA4, "Andrew Solis", &[]),
            ],
        });
        roster.teams.insert(HOME_TEAM, TeamRoster {
            nickname: "Tigers".to_string(),
            lineup: vec![
                player(0xB2, "Valentine Games", &[]),
                player(0xB3, "Don Mitchell", &[]),
                player(0xB4, "Wyatt Glover", &[]),
            ],
        });
        roster.players.insert(HAUNTER, player(0xC1, "Sebastian Telephone", &[]));
        roster
    }

    fn fixture_by_team(side_team: Uuid, pitcher: Uuid, pitcher_name: &str, nickname: &str) -> GameByTeam {
        GameByTeam {
            odds: 0.5,
            outs: 3,
            team: side_team,
            balls: 4,
            bases: 4,
            score: 0.0,
            batter: None,
            pitcher: Some(pitcher),
            strikes: 3,
            team_name: nickname.to_string(),
            team_color: "#000000".to_string(),
            team_emoji: "0x1F41A".to_string(),
            batter_mod: String::new(),
            batter_name: String::new(),
            pitcher_mod: String::new(),
            pitcher_name: pitcher_name.to_string(),
            team_nickname: nickname.to_string(),
            team_batter_count: 0,
            team_secondary_color: "#ffffff".to_string(),
        }
    }

    pub fn fixture_game_update() -> GameUpdate {
        GameUpdate {
            id: GAME_ID,
            day: 2,
            phase: 2,
            rules: Uuid::from_u128(0xF1),
            shame: false,
            inning: 0,
            season: 11,
            weather: 11,
            outcomes: Vec::new(),
            finalized: false,
            game_start: false,
            play_count: 0,
            stadium_id: None,
            statsheet: Uuid::from_u128(0xF2),
            at_bat_balls: 0,
            at_bat_strikes: 0,
            last_update: String::new(),
            tournament: -1,
            repeat_count: 0,
            score_ledger: String::new(),
            score_update: String::new(),
            series_index: 1,
            series_length: 3,
            terminology: Uuid::from_u128(0xF3),
            top_of_inning: true,
            game_complete: false,
            is_postseason: false,
            is_title_match: false,
            base_runners: Vec::new(),
            base_runner_names: Vec::new(),
            base_runner_mods: Vec::new(),
            bases_occupied: Vec::new(),
            baserunner_count: 0,
            game_start_phase: -1,
            half_inning_outs: 0,
            new_inning_phase: -1,
            top_inning_score: 0.0,
            bottom_inning_score: 0.0,
            half_inning_score: 0.0,
            secret_baserunner: None,
            away: fixture_by_team(AWAY_TEAM, AWAY_PITCHER, "Sixpack Dogwalker", "Fridays"),
            home: fixture_by_team(HOME_TEAM, HOME_PITCHER, "Gabriel Griffith", "Tigers"),
        }
    }

    /// The pre-game archived document plus the one the LetsGo event
    /// produces, which is what a real archive's first two updates hold.
    pub fn fixture_bootstrap() -> Vec<ChroniclerGameUpdate> {
        let first = fixture_game_update();
        let mut second = fixture_game_update();
        second.play_count = 1;
        second.phase = 1;
        second.game_start = true;
        second.last_update = "Let's Go!".to_string();
        second.away.team_batter_count = -1;
        second.home.team_batter_count = -1;
        vec![
            ChroniclerGameUpdate {
                timestamp: Utc.with_ymd_and_hms(2021, 3, 1, 16, 0, 0).unwrap(),
                data: first,
            },
            ChroniclerGameUpdate {
                timestamp: Utc.with_ymd_and_hms(2021, 3, 1, 16, 0, 5).unwrap(),
                data: second,
            },
        ]
    }
}
