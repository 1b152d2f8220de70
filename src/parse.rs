use nom::{Finish, IResult, Parser};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till1, take_until1};
use nom::character::complete::digit1;
use nom::combinator::{eof, fail, map_res, opt, verify};
use nom::error::convert_error;
use nom::multi::many0;
use nom::sequence::terminated;
use thiserror::Error;

use crate::api::EventType;

type ParserError<'a> = nom::error::VerboseError<&'a str>;
type ParserResult<'a, Out> = IResult<&'a str, Out, ParserError<'a>>;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Description parse error for {event_type:?} event: {err}")]
    DescriptionParseError {
        event_type: EventType,
        err: String,
    },
}

fn run_parser<'a, F, Out>(event_type: EventType, parser: F, description: &'a str) -> Result<Out, ParseError>
    where F: Fn(&'a str) -> ParserResult<'a, Out> {
    let (_, output) = terminated(parser, eof)(description)
        .finish()
        .map_err(|e| ParseError::DescriptionParseError {
            event_type,
            err: convert_error(description, e),
        })?;

    Ok(output)
}

/// Bases are zero-indexed internally: a runner on "first" occupies base 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i64)]
pub enum Base {
    First = 0,
    Second = 1,
    Third = 2,
    Fourth = 3,
}

impl Base {
    pub fn name(&self) -> &'static str {
        match self {
            Base::First => "first",
            Base::Second => "second",
            Base::Third => "third",
            Base::Fourth => "fourth",
        }
    }
}

fn parse_base(input: &str) -> ParserResult<Base> {
    alt((
        tag("first").map(|_| Base::First),
        tag("second").map(|_| Base::Second),
        tag("third").map(|_| Base::Third),
        tag("fourth").map(|_| Base::Fourth),
    ))(input)
}

fn parse_hit_base(input: &str) -> ParserResult<Base> {
    alt((
        tag("Single!").map(|_| Base::First),
        tag("Double!").map(|_| Base::Second),
        tag("Triple!").map(|_| Base::Third),
        tag("Quadruple!").map(|_| Base::Fourth),
    ))(input)
}

fn parse_whole_number(input: &str) -> ParserResult<i64> {
    map_res(digit1, str::parse)(input)
}

fn parse_terminated(tag_content: &'static str) -> impl Fn(&str) -> ParserResult<&str> {
    move |input| {
        let (input, parsed_value) =
            verify(take_until1(tag_content), |s: &str| !s.contains('\n'))(input)?;
        let (input, _) = tag(tag_content)(input)?;

        Ok((input, parsed_value))
    }
}

/// A free refill is described twice, with the same name both times. Both
/// captures are kept so the state machine can cross-check them.
#[derive(Debug, PartialEq)]
pub struct UseFreeRefill<'a> {
    pub name: &'a str,
    pub name2: &'a str,
}

fn parse_free_refill(input: &str) -> ParserResult<UseFreeRefill> {
    let (input, _) = tag("\n")(input)?;
    let (input, name) = parse_terminated(" used their Free Refill.\n")(input)?;
    let (input, name2) = parse_terminated(" Refills the In!")(input)?;

    Ok((input, UseFreeRefill { name, name2 }))
}

/// One scoring (or sacrifice-scoring) runner, with any free refills cashed
/// in alongside the score.
#[derive(Debug, PartialEq)]
pub struct ParsedScore<'a> {
    pub name: &'a str,
    pub sacrifice: bool,
    pub free_refills: Vec<UseFreeRefill<'a>>,
}

fn parse_score<'a>(sacrifice_label: Option<&'static str>) -> impl Fn(&'a str) -> ParserResult<'a, ParsedScore<'a>> {
    move |input| {
        let (input, _) = tag("\n")(input)?;
        let (input, (name, sacrifice)) = match sacrifice_label {
            // The sacrifice label has to be tried first: a label like
            // " tags up and scores!" also ends in " scores!", and the plain
            // parser would swallow half of it into the name
            Some(label) => alt((
                parse_terminated(label).map(|n| (n, true)),
                parse_terminated(" scores!").map(|n| (n, false)),
            ))(input)?,
            None => {
                let (input, name) = parse_terminated(" scores!")(input)?;
                (input, (name, false))
            }
        };
        let (input, free_refills) = many0(parse_free_refill)(input)?;

        Ok((input, ParsedScore { name, sacrifice, free_refills }))
    }
}

fn parse_scores<'a>(sacrifice_label: Option<&'static str>) -> impl Fn(&'a str) -> ParserResult<'a, Vec<ParsedScore<'a>>> {
    move |input| many0(parse_score(sacrifice_label))(input)
}

#[derive(Debug, PartialEq)]
pub struct Inhabiting<'a> {
    pub haunter_name: &'a str,
    pub haunted_name: &'a str,
}

#[derive(Debug, PartialEq)]
pub struct ParsedBatterUp<'a> {
    pub inhabiting: Option<Inhabiting<'a>>,
    pub batter_name: &'a str,
    pub team_nickname: &'a str,
    pub wielding: Vec<&'a str>,
}

pub fn parse_batter_up(description: &str) -> Result<ParsedBatterUp, ParseError> {
    run_parser(EventType::BatterUp, batter_up, description)
}

fn batter_up(input: &str) -> ParserResult<ParsedBatterUp> {
    let (input, inhabiting) = opt(batter_up_inhabiting)(input)?;
    let (input, batter_name) = parse_terminated(" batting for the ")(input)?;
    // This is going to fail if a team ever has a period or comma in it
    let (input, team_nickname) = take_till1(|c| c == ',' || c == '.')(input)?;
    let (input, wielding) = parse_wielding_items(input)?;

    Ok((input, ParsedBatterUp { inhabiting, batter_name, team_nickname, wielding }))
}

fn batter_up_inhabiting(input: &str) -> ParserResult<Inhabiting> {
    let (input, haunter_name) = parse_terminated(" is Inhabiting ")(input)?;
    let (input, haunted_name) = parse_terminated("!\n")(input)?;

    Ok((input, Inhabiting { haunter_name, haunted_name }))
}

// Legacy item names can contain periods ("the Iffey Jr."), so the trailing
// period of the description has to be found from the right.
fn parse_wielding_items(input: &str) -> ParserResult<Vec<&str>> {
    if input == "." {
        return Ok((&input[1..], Vec::new()));
    }

    let (idx, _) = match input.rmatch_indices('.').next() {
        Some(found) => found,
        None => return fail(input),
    };
    let (mut body, rest) = (&input[..idx], &input[idx..]);
    let (rest, _) = tag(".")(rest)?;

    let mut items = Vec::new();
    while !body.is_empty() {
        let (after_sep, _) = tag(", wielding ")(body)?;
        let item_end = after_sep.find(", wielding ").unwrap_or(after_sep.len());
        items.push(&after_sep[..item_end]);
        body = &after_sep[item_end..];
    }

    Ok((rest, items))
}

#[derive(Debug, PartialEq)]
pub enum ParsedSteal<'a> {
    StolenBase {
        runner_name: &'a str,
        base: Base,
        // Name from the blaserunning line, cross-checked against the runner
        blaserunning: Option<&'a str>,
        free_refills: Vec<UseFreeRefill<'a>>,
    },
    CaughtStealing {
        runner_name: &'a str,
        base: Base,
    },
}

pub fn parse_steal(description: &str) -> Result<ParsedSteal, ParseError> {
    run_parser(EventType::StolenBase, steal, description)
}

fn steal(input: &str) -> ParserResult<ParsedSteal> {
    alt((stolen_base, caught_stealing))(input)
}

fn stolen_base(input: &str) -> ParserResult<ParsedSteal> {
    let (input, runner_name) = parse_terminated(" steals ")(input)?;
    let (input, base) = parse_base(input)?;
    let (input, _) = tag(" base!")(input)?;
    let (input, blaserunning) = opt(|input| {
        let (input, _) = tag("\n")(input)?;
        let (input, name) = parse_terminated(" scores with Blaserunning!")(input)?;
        Ok((input, name))
    })(input)?;
    let (input, free_refills) = many0(parse_free_refill)(input)?;

    Ok((input, ParsedSteal::StolenBase { runner_name, base, blaserunning, free_refills }))
}

fn caught_stealing(input: &str) -> ParserResult<ParsedSteal> {
    let (input, runner_name) = parse_terminated(" gets caught stealing ")(input)?;
    let (input, base) = parse_base(input)?;
    let (input, _) = tag(" base.")(input)?;

    Ok((input, ParsedSteal::CaughtStealing { runner_name, base }))
}

#[derive(Debug, PartialEq)]
pub struct ParsedWalk<'a> {
    pub batter_name: &'a str,
    pub scores: Vec<ParsedScore<'a>>,
}

pub fn parse_walk(description: &str) -> Result<ParsedWalk, ParseError> {
    run_parser(EventType::Walk, walk, description)
}

fn walk(input: &str) -> ParserResult<ParsedWalk> {
    let (input, batter_name) = parse_terminated(" draws a walk.")(input)?;
    let (input, scores) = parse_scores(None)(input)?;

    Ok((input, ParsedWalk { batter_name, scores }))
}

#[derive(Debug, PartialEq)]
pub enum StrikeoutKind {
    Swinging,
    Looking,
}

#[derive(Debug, PartialEq)]
pub enum ParsedStrikeout<'a> {
    Strikeout {
        batter_name: &'a str,
        kind: StrikeoutKind,
    },
    Charm {
        pitcher_name: &'a str,
        batter_name: &'a str,
        batter_name2: &'a str,
        num_swings: i64,
    },
}

pub fn parse_strikeout(description: &str) -> Result<ParsedStrikeout, ParseError> {
    run_parser(EventType::Strikeout, strikeout, description)
}

fn strikeout(input: &str) -> ParserResult<ParsedStrikeout> {
    alt((normal_strikeout, charm_strikeout))(input)
}

fn normal_strikeout(input: &str) -> ParserResult<ParsedStrikeout> {
    let (input, batter_name) = parse_terminated(" strikes out ")(input)?;
    let (input, kind) = alt((
        tag("swinging.").map(|_| StrikeoutKind::Swinging),
        tag("looking.").map(|_| StrikeoutKind::Looking),
    ))(input)?;

    Ok((input, ParsedStrikeout::Strikeout { batter_name, kind }))
}

fn charm_strikeout(input: &str) -> ParserResult<ParsedStrikeout> {
    let (input, pitcher_name) = parse_terminated(" charmed ")(input)?;
    let (input, batter_name) = parse_terminated("!\n")(input)?;
    let (input, batter_name2) = parse_terminated(" swings ")(input)?;
    let (input, num_swings) = parse_whole_number(input)?;
    let (input, _) = tag(" times to strike out willingly!")(input)?;

    Ok((input, ParsedStrikeout::Charm { pitcher_name, batter_name, batter_name2, num_swings }))
}

#[derive(Debug, PartialEq)]
pub enum ParsedFieldingOut<'a> {
    Flyout {
        batter_name: &'a str,
        fielder_name: &'a str,
        scores: Vec<ParsedScore<'a>>,
    },
    GroundOut {
        batter_name: &'a str,
        fielder_name: &'a str,
        scores: Vec<ParsedScore<'a>>,
    },
    DoublePlay {
        batter_name: &'a str,
        scores: Vec<ParsedScore<'a>>,
    },
    FieldersChoice {
        runner_out_name: &'a str,
        base: Base,
        scores: Vec<ParsedScore<'a>>,
        batter_name: &'a str,
    },
}

pub fn parse_fielding_out(event_type: EventType, description: &str) -> Result<ParsedFieldingOut, ParseError> {
    run_parser(event_type, fielding_out, description)
}

fn fielding_out(input: &str) -> ParserResult<ParsedFieldingOut> {
    alt((flyout, ground_out, double_play, fielders_choice))(input)
}

fn flyout(input: &str) -> ParserResult<ParsedFieldingOut> {
    let (input, batter_name) = parse_terminated(" hit a flyout to ")(input)?;
    let (input, fielder_name) = parse_terminated(".")(input)?;
    let (input, scores) = parse_scores(Some(" tags up and scores!"))(input)?;

    Ok((input, ParsedFieldingOut::Flyout { batter_name, fielder_name, scores }))
}

fn ground_out(input: &str) -> ParserResult<ParsedFieldingOut> {
    let (input, batter_name) = parse_terminated(" hit a ground out to ")(input)?;
    let (input, fielder_name) = parse_terminated(".")(input)?;
    let (input, scores) = parse_scores(Some(" advances on the sacrifice."))(input)?;

    Ok((input, ParsedFieldingOut::GroundOut { batter_name, fielder_name, scores }))
}

fn double_play(input: &str) -> ParserResult<ParsedFieldingOut> {
    let (input, batter_name) = parse_terminated(" hit into a double play!")(input)?;
    let (input, scores) = parse_scores(None)(input)?;

    Ok((input, ParsedFieldingOut::DoublePlay { batter_name, scores }))
}

fn fielders_choice(input: &str) -> ParserResult<ParsedFieldingOut> {
    let (input, runner_out_name) = parse_terminated(" out at ")(input)?;
    let (input, base) = parse_base(input)?;
    let (input, _) = tag(" base.")(input)?;
    let (input, scores) = parse_scores(None)(input)?;
    let (input, _) = tag("\n")(input)?;
    let (input, batter_name) = parse_terminated(" reaches on fielder's choice.")(input)?;

    Ok((input, ParsedFieldingOut::FieldersChoice { runner_out_name, base, scores, batter_name }))
}

#[derive(Debug, PartialEq)]
pub struct ParsedHit<'a> {
    pub batter_name: &'a str,
    pub base: Base,
    pub heating_up: Option<&'a str>,
    pub scores: Vec<ParsedScore<'a>>,
}

pub fn parse_hit(description: &str) -> Result<ParsedHit, ParseError> {
    run_parser(EventType::Hit, hit, description)
}

fn hit(input: &str) -> ParserResult<ParsedHit> {
    let (input, batter_name) = parse_terminated(" hits a ")(input)?;
    let (input, base) = parse_hit_base(input)?;
    let (input, heating_up) = opt(|input| {
        let (input, _) = tag("\n")(input)?;
        let (input, name) = parse_terminated(" is Heating Up!")(input)?;
        Ok((input, name))
    })(input)?;
    let (input, scores) = parse_scores(None)(input)?;

    Ok((input, ParsedHit { batter_name, base, heating_up, scores }))
}

#[derive(Debug, PartialEq)]
pub struct ParsedHomeRun<'a> {
    pub batter_name: &'a str,
    pub num_scores: i64,
    pub free_refills: Vec<UseFreeRefill<'a>>,
}

pub fn parse_home_run(description: &str) -> Result<ParsedHomeRun, ParseError> {
    run_parser(EventType::HomeRun, home_run, description)
}

fn home_run(input: &str) -> ParserResult<ParsedHomeRun> {
    let (input, batter_name) = parse_terminated(" hits a ")(input)?;
    let (input, num_scores) = alt((
        tag("solo home run!").map(|_| 1),
        tag("2-run home run!").map(|_| 2),
        tag("3-run home run!").map(|_| 3),
        tag("grand slam!").map(|_| 4), // dunno what happens with a pentaslam...
    ))(input)?;
    let (input, free_refills) = many0(parse_free_refill)(input)?;

    Ok((input, ParsedHomeRun { batter_name, num_scores, free_refills }))
}

#[derive(Debug, PartialEq)]
pub enum MildPitchType<'a> {
    Ball { balls: i64, strikes: i64 },
    Walk { batter_name: &'a str },
}

#[derive(Debug, PartialEq)]
pub struct ParsedMildPitch<'a> {
    pub pitcher_name: &'a str,
    pub pitch: MildPitchType<'a>,
    pub scores: Vec<ParsedScore<'a>>,
}

pub fn parse_mild_pitch(description: &str) -> Result<ParsedMildPitch, ParseError> {
    run_parser(EventType::MildPitch, mild_pitch, description)
}

fn mild_pitch(input: &str) -> ParserResult<ParsedMildPitch> {
    let (input, pitcher_name) = parse_terminated(" throws a Mild pitch!\n")(input)?;
    let (input, pitch) = alt((
        mild_pitch_ball,
        parse_terminated(" draws a walk.").map(|batter_name| MildPitchType::Walk { batter_name }),
    ))(input)?;
    let (input, scores) = parse_scores(None)(input)?;

    Ok((input, ParsedMildPitch { pitcher_name, pitch, scores }))
}

fn mild_pitch_ball(input: &str) -> ParserResult<MildPitchType> {
    // Can't reuse the pitch-count parser; a mild pitch's count ends with a
    // period where an ordinary ball has none
    let (input, _) = tag("Ball, ")(input)?;
    let (input, balls) = parse_whole_number(input)?;
    let (input, _) = tag("-")(input)?;
    let (input, strikes) = parse_whole_number(input)?;
    let (input, _) = tag(".")(input)?;

    Ok((input, MildPitchType::Ball { balls, strikes }))
}

/// The only blooddrain shape seen in the corpus this was built against: a
/// siphon granting its holder a strike. Every sipper capture is kept for
/// the state machine's equality checks.
#[derive(Debug, PartialEq)]
pub struct ParsedSiphonStrike<'a> {
    pub sipper_name: &'a str,
    pub sipper_name2: &'a str,
    pub sippee_name: &'a str,
    pub category: &'a str,
    pub sipper_name3: &'a str,
}

pub fn parse_blooddrain(description: &str) -> Result<ParsedSiphonStrike, ParseError> {
    run_parser(EventType::Blooddrain, blooddrain_siphon_strike, description)
}

fn blooddrain_siphon_strike(input: &str) -> ParserResult<ParsedSiphonStrike> {
    let (input, _) = tag("The Blooddrain gurgled!\n")(input)?;
    let (input, sipper_name) = parse_terminated("'s Siphon activates!\n")(input)?;
    let (input, sipper_name2) = parse_terminated(" siphoned some of ")(input)?;
    let (input, sippee_name) = parse_terminated("'s ")(input)?;
    let (input, category) = alt((
        tag("hitting"),
        tag("baserunning"),
        tag("pitching"),
        tag("defensive"),
    ))(input)?;
    let (input, _) = tag(" ability!\n")(input)?;
    let (input, sipper_name3) = parse_terminated(" adds a Strike!")(input)?;

    Ok((input, ParsedSiphonStrike { sipper_name, sipper_name2, sippee_name, category, sipper_name3 }))
}

#[derive(Debug, PartialEq)]
pub struct ParsedCoffeeBean<'a> {
    pub player_name: &'a str,
    pub roast: &'a str,
    pub notes: &'a str,
    pub player_name2: &'a str,
    pub wired: bool,
    pub gained: bool,
}

pub fn parse_coffee_bean(description: &str) -> Result<ParsedCoffeeBean, ParseError> {
    run_parser(EventType::CoffeeBean, coffee_bean, description)
}

fn coffee_bean(input: &str) -> ParserResult<ParsedCoffeeBean> {
    let (input, player_name) = parse_terminated(" is Beaned by a ")(input)?;
    let (input, roast) = parse_terminated(" roast with ")(input)?;
    let (input, notes) = parse_terminated(".\n")(input)?;
    let (input, player_name2) = parse_terminated(" is ")(input)?;
    let (input, (wired, gained)) = alt((
        tag("Wired!").map(|_| (true, true)),
        tag("no longer Wired!").map(|_| (true, false)),
        tag("Tired.").map(|_| (false, true)),
        tag("no longer Tired!").map(|_| (false, false)),
    ))(input)?;

    Ok((input, ParsedCoffeeBean { player_name, roast, notes, player_name2, wired, gained }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batter_up_plain() {
        let parsed = parse_batter_up("Jessica Telephone batting for the Pies.").unwrap();
        assert_eq!(parsed, ParsedBatterUp {
            inhabiting: None,
            batter_name: "Jessica Telephone",
            team_nickname: "Pies",
            wielding: vec![],
        });
    }

    #[test]
    fn batter_up_inhabiting_and_wielding() {
        // An item name ending in a period gets the description's own
        // terminator appended after it
        let parsed = parse_batter_up(
            "Sebastian Telephone is Inhabiting Jessica Telephone!\n\
             Sebastian Telephone batting for the Pies, wielding the Iffey Jr..",
        ).unwrap();
        assert_eq!(parsed.inhabiting, Some(Inhabiting {
            haunter_name: "Sebastian Telephone",
            haunted_name: "Jessica Telephone",
        }));
        assert_eq!(parsed.batter_name, "Sebastian Telephone");
        assert_eq!(parsed.team_nickname, "Pies");
        assert_eq!(parsed.wielding, vec!["the Iffey Jr."]);
    }

    #[test]
    fn batter_up_wielding_simple_item() {
        let parsed = parse_batter_up("Jessica Telephone batting for the Pies, wielding Rockfist.").unwrap();
        assert_eq!(parsed.wielding, vec!["Rockfist"]);
    }

    #[test]
    fn batter_up_missing_period_is_rejected() {
        assert!(parse_batter_up("Jessica Telephone batting for the Pies").is_err());
    }

    #[test]
    fn steal_second() {
        let parsed = parse_steal("Jaylen Hotdogfingers steals second base!").unwrap();
        assert_eq!(parsed, ParsedSteal::StolenBase {
            runner_name: "Jaylen Hotdogfingers",
            base: Base::Second,
            blaserunning: None,
            free_refills: vec![],
        });
    }

    #[test]
    fn steal_with_blaserunning_and_refill() {
        let parsed = parse_steal(
            "Nagomi Mcdaniel steals fourth base!\n\
             Nagomi Mcdaniel scores with Blaserunning!\n\
             Nagomi Mcdaniel used their Free Refill.\n\
             Nagomi Mcdaniel Refills the In!",
        ).unwrap();
        assert_eq!(parsed, ParsedSteal::StolenBase {
            runner_name: "Nagomi Mcdaniel",
            base: Base::Fourth,
            blaserunning: Some("Nagomi Mcdaniel"),
            free_refills: vec![UseFreeRefill { name: "Nagomi Mcdaniel", name2: "Nagomi Mcdaniel" }],
        });
    }

    #[test]
    fn caught_stealing() {
        let parsed = parse_steal("Don Mitchell gets caught stealing third base.").unwrap();
        assert_eq!(parsed, ParsedSteal::CaughtStealing {
            runner_name: "Don Mitchell",
            base: Base::Third,
        });
    }

    #[test]
    fn steal_unknown_base_is_rejected() {
        assert!(parse_steal("Don Mitchell steals fifth base!").is_err());
    }

    #[test]
    fn walk_with_score() {
        let parsed = parse_walk("Andrew Solis draws a walk.\nValentine Games scores!").unwrap();
        assert_eq!(parsed.batter_name, "Andrew Solis");
        assert_eq!(parsed.scores, vec![ParsedScore {
            name: "Valentine Games",
            sacrifice: false,
            free_refills: vec![],
        }]);
    }

    #[test]
    fn strikeout_swinging() {
        let parsed = parse_strikeout("Rivers Rosa strikes out swinging.").unwrap();
        assert_eq!(parsed, ParsedStrikeout::Strikeout {
            batter_name: "Rivers Rosa",
            kind: StrikeoutKind::Swinging,
        });
    }

    #[test]
    fn charm_strikeout() {
        let parsed = parse_strikeout(
            "Elijah Valenzuela charmed Wyatt Glover!\n\
             Wyatt Glover swings 3 times to strike out willingly!",
        ).unwrap();
        assert_eq!(parsed, ParsedStrikeout::Charm {
            pitcher_name: "Elijah Valenzuela",
            batter_name: "Wyatt Glover",
            batter_name2: "Wyatt Glover",
            num_swings: 3,
        });
    }

    #[test]
    fn flyout_with_tag_up() {
        let parsed = parse_fielding_out(
            EventType::FlyOut,
            "Hobbs Cain hit a flyout to Randall Marijuana.\nGoodwin Morin tags up and scores!",
        ).unwrap();
        assert_eq!(parsed, ParsedFieldingOut::Flyout {
            batter_name: "Hobbs Cain",
            fielder_name: "Randall Marijuana",
            scores: vec![ParsedScore { name: "Goodwin Morin", sacrifice: true, free_refills: vec![] }],
        });
    }

    #[test]
    fn ground_out_simple() {
        let parsed = parse_fielding_out(
            EventType::GroundOut,
            "Marco Stink hit a ground out to Wyatt Quitter.",
        ).unwrap();
        assert_eq!(parsed, ParsedFieldingOut::GroundOut {
            batter_name: "Marco Stink",
            fielder_name: "Wyatt Quitter",
            scores: vec![],
        });
    }

    #[test]
    fn double_play() {
        let parsed = parse_fielding_out(
            EventType::GroundOut,
            "Conrad Vaughan hit into a double play!",
        ).unwrap();
        assert_eq!(parsed, ParsedFieldingOut::DoublePlay {
            batter_name: "Conrad Vaughan",
            scores: vec![],
        });
    }

    #[test]
    fn fielders_choice_with_score() {
        let parsed = parse_fielding_out(
            EventType::GroundOut,
            "Sandie Turner out at second base.\n\
             Pitstop Clamps scores!\n\
             Alyssa Harrell reaches on fielder's choice.",
        ).unwrap();
        assert_eq!(parsed, ParsedFieldingOut::FieldersChoice {
            runner_out_name: "Sandie Turner",
            base: Base::Second,
            scores: vec![ParsedScore { name: "Pitstop Clamps", sacrifice: false, free_refills: vec![] }],
            batter_name: "Alyssa Harrell",
        });
    }

    #[test]
    fn hit_with_heating_up_and_score() {
        let parsed = parse_hit(
            "Jessica Telephone hits a Double!\n\
             Jessica Telephone is Heating Up!\n\
             Peanut Bong scores!",
        ).unwrap();
        assert_eq!(parsed.batter_name, "Jessica Telephone");
        assert_eq!(parsed.base, Base::Second);
        assert_eq!(parsed.heating_up, Some("Jessica Telephone"));
        assert_eq!(parsed.scores.len(), 1);
    }

    #[test]
    fn home_run_variants() {
        assert_eq!(parse_home_run("Aldon Cashmoney hits a solo home run!").unwrap().num_scores, 1);
        assert_eq!(parse_home_run("Aldon Cashmoney hits a 2-run home run!").unwrap().num_scores, 2);
        assert_eq!(parse_home_run("Aldon Cashmoney hits a grand slam!").unwrap().num_scores, 4);

        let parsed = parse_home_run(
            "Valentine Games hits a solo home run!\n\
             Valentine Games used their Free Refill.\n\
             Valentine Games Refills the In!",
        ).unwrap();
        assert_eq!(parsed.free_refills.len(), 1);
    }

    #[test]
    fn mild_pitch_ball() {
        let parsed = parse_mild_pitch("Gabriel Griffith throws a Mild pitch!\nBall, 2-1.").unwrap();
        assert_eq!(parsed.pitcher_name, "Gabriel Griffith");
        assert_eq!(parsed.pitch, MildPitchType::Ball { balls: 2, strikes: 1 });
    }

    #[test]
    fn mild_pitch_walk() {
        let parsed = parse_mild_pitch(
            "Gabriel Griffith throws a Mild pitch!\nPatty Fox draws a walk.",
        ).unwrap();
        assert_eq!(parsed.pitch, MildPitchType::Walk { batter_name: "Patty Fox" });
    }

    #[test]
    fn blooddrain_siphon_strike() {
        let parsed = parse_blooddrain(
            "The Blooddrain gurgled!\n\
             Nicholas Mora's Siphon activates!\n\
             Nicholas Mora siphoned some of Sutton Bishop's hitting ability!\n\
             Nicholas Mora adds a Strike!",
        ).unwrap();
        assert_eq!(parsed.sipper_name, "Nicholas Mora");
        assert_eq!(parsed.sippee_name, "Sutton Bishop");
        assert_eq!(parsed.category, "hitting");
        assert_eq!(parsed.sipper_name3, "Nicholas Mora");
    }

    #[test]
    fn blooddrain_other_actions_are_rejected() {
        assert!(parse_blooddrain(
            "The Blooddrain gurgled!\n\
             Nicholas Mora's Siphon activates!\n\
             Nicholas Mora siphoned some of Sutton Bishop's hitting ability!\n\
             Nicholas Mora adds a Ball!",
        ).is_err());
    }

    #[test]
    fn coffee_bean() {
        let parsed = parse_coffee_bean(
            "Sixpack Dogwalker is Beaned by a Medium roast with cream.\n\
             Sixpack Dogwalker is Wired!",
        ).unwrap();
        assert_eq!(parsed.player_name, "Sixpack Dogwalker");
        assert_eq!(parsed.player_name2, "Sixpack Dogwalker");
        assert_eq!(parsed.roast, "Medium");
        assert!(parsed.wired && parsed.gained);
    }

}
