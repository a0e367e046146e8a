use boxscore::game::{EventKind, NewEvent, Period, PlayerId, ShotCategory, TeamId};

// ============================================================================
// Event Script Builder
// ============================================================================

/// Builds a list of well-formed events in the order they are written
#[derive(Clone, Default)]
pub struct EventScript {
    period: Option<Period>,
    events: Vec<NewEvent>,
}

impl EventScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Period for the events that follow. Defaults to Q1.
    pub fn in_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    fn push(mut self, event: NewEvent) -> Self {
        self.events.push(event);
        self
    }

    fn event(&self, kind: EventKind, clock: i64, team: &str) -> NewEvent {
        NewEvent::new(
            kind,
            self.period.unwrap_or(Period::Q1),
            clock,
            TeamId::from(team),
        )
    }

    pub fn made(self, clock: i64, team: &str, player: PlayerId, category: ShotCategory) -> Self {
        let event = self
            .event(EventKind::ShotMade, clock, team)
            .with_player(player)
            .with_shot(category);
        self.push(event)
    }

    pub fn missed(self, clock: i64, team: &str, player: PlayerId, category: ShotCategory) -> Self {
        let event = self
            .event(EventKind::ShotMissed, clock, team)
            .with_player(player)
            .with_shot(category);
        self.push(event)
    }

    pub fn rebound(self, clock: i64, team: &str, player: PlayerId) -> Self {
        let event = self.event(EventKind::Rebound, clock, team).with_player(player);
        self.push(event)
    }

    /// `leaving` exits and `entering` enters the court
    pub fn substitution(
        self,
        clock: i64,
        team: &str,
        leaving: PlayerId,
        entering: PlayerId,
    ) -> Self {
        let event = self
            .event(EventKind::Substitution, clock, team)
            .with_player(leaving)
            .with_second_player(entering);
        self.push(event)
    }

    pub fn assist(self, clock: i64, team: &str, passer: PlayerId, scorer: PlayerId) -> Self {
        let event = self
            .event(EventKind::Assist, clock, team)
            .with_player(passer)
            .with_second_player(scorer);
        self.push(event)
    }

    /// Foul, steal, block or turnover credited to one player
    pub fn counter(self, kind: EventKind, clock: i64, team: &str, player: PlayerId) -> Self {
        let event = self.event(kind, clock, team).with_player(player);
        self.push(event)
    }

    pub fn timeout(self, clock: i64, team: &str) -> Self {
        let event = self.event(EventKind::Timeout, clock, team);
        self.push(event)
    }

    pub fn build(self) -> Vec<NewEvent> {
        self.events
    }
}

/// Every ordering of `items`
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }

    let mut all = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            all.push(tail);
        }
    }
    all
}
