//! World generation passes and play styles.
//!
//! Column hooks register for one generation pass and a set of play styles;
//! the pipeline only calls a hook when both match the running world.

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    /// Play styles a world can be created with.
    pub struct PlayStyleFlags: u8 {
        const CREATIVE_BUILDING = 0b0000_0001;
        const SURVIVE_AND_BUILD = 0b0000_0010;
        const SURVIVE_AND_AUTOMATE = 0b0000_0100;
        const WILDERNESS_SURVIVAL = 0b0000_1000;
    }
}

impl PlayStyleFlags {
    /// Parse a play-style name (`creative`, `survival`, `automate`, `wilderness`).
    pub fn from_play_style_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "creative" | "creativebuilding" => Some(Self::CREATIVE_BUILDING),
            "survival" | "surviveandbuild" => Some(Self::SURVIVE_AND_BUILD),
            "automate" | "surviveandautomate" => Some(Self::SURVIVE_AND_AUTOMATE),
            "wilderness" | "wildernesssurvival" => Some(Self::WILDERNESS_SURVIVAL),
            _ => None,
        }
    }
}

/// Stages of chunk column generation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GenerationPass {
    Terrain,
    TerrainFeatures,
    Vegetation,
    NeighbourSunlight,
    /// Last pass before the column goes live; all terrain is final.
    PreDone,
}

/// Pass and play styles a column hook is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookRegistration {
    pub pass: GenerationPass,
    pub play_styles: PlayStyleFlags,
}

impl HookRegistration {
    /// Whether the hook runs during `pass` in a world of `play_style`.
    pub fn runs_for(&self, pass: GenerationPass, play_style: PlayStyleFlags) -> bool {
        pass == self.pass && self.play_styles.intersects(play_style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survival_hook() -> HookRegistration {
        HookRegistration {
            pass: GenerationPass::PreDone,
            play_styles: PlayStyleFlags::SURVIVE_AND_BUILD | PlayStyleFlags::WILDERNESS_SURVIVAL,
        }
    }

    #[test]
    fn hook_needs_matching_pass_and_play_style() {
        let hook = survival_hook();
        assert!(hook.runs_for(GenerationPass::PreDone, PlayStyleFlags::SURVIVE_AND_BUILD));
        assert!(!hook.runs_for(GenerationPass::Vegetation, PlayStyleFlags::SURVIVE_AND_BUILD));
        assert!(!hook.runs_for(GenerationPass::PreDone, PlayStyleFlags::CREATIVE_BUILDING));
        assert!(!hook.runs_for(GenerationPass::PreDone, PlayStyleFlags::empty()));
    }

    #[test]
    fn play_style_names_parse() {
        assert_eq!(
            PlayStyleFlags::from_play_style_name(" Wilderness "),
            Some(PlayStyleFlags::WILDERNESS_SURVIVAL)
        );
        assert_eq!(
            PlayStyleFlags::from_play_style_name("surviveandautomate"),
            Some(PlayStyleFlags::SURVIVE_AND_AUTOMATE)
        );
        assert_eq!(PlayStyleFlags::from_play_style_name("hardcore"), None);
    }

    #[test]
    fn passes_are_ordered() {
        assert!(GenerationPass::Terrain < GenerationPass::Vegetation);
        assert!(GenerationPass::NeighbourSunlight < GenerationPass::PreDone);
    }
}
