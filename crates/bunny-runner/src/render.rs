//! Console presentation of a running world.

use bunny_core::{DeathCause, Kind, Sex};
use bunny_world::{Agent, Frame, LifecycleSink, TracingSink};
use std::io::{self, Write};

pub fn birth_line(agent: &Agent) -> String {
    match agent.kind {
        Kind::WhiteWalker => format!("White Walker bunny {} was born!", agent.name),
        kind => format!(
            "{} {} of bunny house {} of color {} was born!",
            agent.sex.title(),
            agent.name,
            kind,
            agent.color
        ),
    }
}

pub fn death_line(agent: &Agent, cause: DeathCause) -> String {
    let pronoun = match agent.sex {
        Sex::Male => "He",
        Sex::Female => "She",
    };
    let how = match cause {
        DeathCause::OldAge => "died at age",
        DeathCause::PressureRelease => "perished in the long hard winter at age",
        DeathCause::Combat => "fell in battle at age",
        DeathCause::ApexStrike => "was burned by the dragon at age",
    };
    match (agent.kind.sigil(), agent.kind.saying()) {
        (Some(sigil), Some(saying)) => format!(
            "{} {} of bunny house {} {} {}! {} was a fierce {}! {}",
            agent.sex.title(),
            agent.name,
            agent.kind,
            how,
            agent.age,
            pronoun,
            sigil,
            saying
        ),
        _ => format!("{} {} {} {}!", agent.kind, agent.name, how, agent.age),
    }
}

pub fn conversion_line(agent: &Agent, former: Kind) -> String {
    let (pronoun, object) = match agent.sex {
        Sex::Male => ("He", "him"),
        Sex::Female => ("She", "her"),
    };
    format!(
        "{} {} of bunny house {} turned to a White! {} is lost, kill {} and burn the body!",
        agent.sex.title(),
        agent.name,
        former,
        pronoun,
        object
    )
}

/// Prints lifecycle lines and the grid after every turn, and forwards every
/// event to the structured log as well.
///
/// Write failures are kept and reported through [`ConsoleSink::take_error`]
/// since sink callbacks cannot fail.
pub struct ConsoleSink<W: Write> {
    out: W,
    log: TracingSink,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            log: TracingSink,
            error: None,
        }
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            self.error = Some(e);
        }
    }
}

impl<W: Write> LifecycleSink for ConsoleSink<W> {
    fn on_birth(&mut self, agent: &Agent) {
        self.log.on_birth(agent);
        self.write(&format!("{}\n", birth_line(agent)));
    }

    fn on_death(&mut self, agent: &Agent, cause: DeathCause) {
        self.log.on_death(agent, cause);
        self.write(&format!("{}\n", death_line(agent, cause)));
    }

    fn on_conversion(&mut self, agent: &Agent, former: Kind) {
        self.log.on_conversion(agent, former);
        self.write(&format!("{}\n", conversion_line(agent, former)));
    }

    fn on_turn_complete(&mut self, frame: &Frame<'_>) {
        self.log.on_turn_complete(frame);
        let border = "=".repeat(frame.grid.width.max(0) as usize * 2);
        let text = format!(
            "{border}\nTurn {} | population {}\n{}{border}\n",
            frame.turn,
            frame.population.count(),
            frame.render()
        );
        self.write(&text);
        if let Err(e) = self.out.flush() {
            self.error.get_or_insert(e);
        }
    }

    fn on_capacity_warning(&mut self, population: usize, capacity: usize) {
        self.log.on_capacity_warning(population, capacity);
        self.write(&format!(
            "Not enough space on the grid for {population} bunnies ({capacity} cells), nobody moves this turn\n"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bunny_core::{AgentId, Color};

    fn bunny(kind: Kind, sex: Sex) -> Agent {
        let mut agent = Agent::new(AgentId::new(), "ABCDE12345".to_string(), sex, Color::Gold, kind);
        agent.age = 7;
        agent
    }

    #[test]
    fn test_birth_lines() {
        assert_eq!(
            birth_line(&bunny(Kind::Stark, Sex::Female)),
            "Lady ABCDE12345 of bunny house Stark of color Gold was born!"
        );
        assert_eq!(
            birth_line(&bunny(Kind::WhiteWalker, Sex::Male)),
            "White Walker bunny ABCDE12345 was born!"
        );
    }

    #[test]
    fn test_death_lines() {
        assert_eq!(
            death_line(&bunny(Kind::Lannister, Sex::Male), DeathCause::OldAge),
            "Lord ABCDE12345 of bunny house Lannister died at age 7! He was a fierce Lion! Hear Me Roar!"
        );
        assert_eq!(
            death_line(&bunny(Kind::WhiteWalker, Sex::Female), DeathCause::Combat),
            "White Walker ABCDE12345 fell in battle at age 7!"
        );
        assert_eq!(
            death_line(&bunny(Kind::Stark, Sex::Female), DeathCause::PressureRelease),
            "Lady ABCDE12345 of bunny house Stark perished in the long hard winter at age 7! She was a fierce Wolf! Winter Is Coming!"
        );
    }

    #[test]
    fn test_console_sink_writes_lines() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.on_birth(&bunny(Kind::Baratheon, Sex::Male));
        sink.on_conversion(&bunny(Kind::WhiteWalker, Sex::Female), Kind::Baratheon);
        assert!(sink.take_error().is_none());

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Lord ABCDE12345 of bunny house Baratheon"));
        assert_eq!(
            lines[1],
            "Lady ABCDE12345 of bunny house Baratheon turned to a White! She is lost, kill her and burn the body!"
        );
    }
}
