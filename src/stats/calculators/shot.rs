use crate::game::ShotCategory;

/// Point value and shooting buckets of one shot attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotOutcome {
    pub category: ShotCategory,
    pub made: bool,
}

impl ShotOutcome {
    /// An absent category is bucketed as a two-pointer
    pub fn classify(category: Option<ShotCategory>, made: bool) -> Self {
        Self {
            category: category.unwrap_or(ShotCategory::TwoPoint),
            made,
        }
    }

    pub fn point_value(&self) -> u32 {
        match self.category {
            ShotCategory::FreeThrow => 1,
            ShotCategory::ThreePoint => 3,
            ShotCategory::TwoPoint => 2,
        }
    }

    /// Points credited by this attempt
    pub fn points(&self) -> u32 {
        if self.made {
            self.point_value()
        } else {
            0
        }
    }

    /// Free throws never count towards field-goal counters
    pub fn is_field_goal(&self) -> bool {
        self.category != ShotCategory::FreeThrow
    }
}
