//! Versioned game event dispatch tables.
//!
//! Each build threshold is a list of patches over the table of the previous threshold. The
//! tables are folded once and shared by every decode.

use crate::errors::StreamKind;
use crate::schema::{Line, SchemaTable};
use fnv::FnvHashMap;
use std::sync::OnceLock;

pub type DispatchTable = FnvHashMap<u8, Entry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureLayout {
    /// Four bit count of signature bytes
    Short,
    Long,
    WithToon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UserOptionsLayout {
    Base,
    V22612,
    V23260,
    HotsBeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandLayout {
    /// Fixed width fields with a 32 bit flag word
    Legacy,
    Flags17,
    Flags18,

    /// The unit target gains a control player
    Flags18Control,
    Flags20,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SelectionLayout {
    /// The remove mask is always a bitmask
    Legacy,

    /// The remove mask is a choice between a bitmask and index lists
    Choice,

    /// Indices and counts are nine bits wide
    Wide,

    /// Subgroups carry a priority
    WidePriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCheckLayout {
    Narrow,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AiLayout {
    Base,
    V19595,
    V22612,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraLayout {
    TargetRequired,
    TargetOptional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogLayout {
    Base,
    MouseButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSyncLayout {
    Bytes,
    Bits7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MouseLayout {
    /// Full width coordinates
    Base,

    /// Packed coordinates
    Packed,

    /// Adds a flag byte to the previous layout
    Flagged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementLayout {
    Bits32,
    Bits19,
}

/// The payload parser selected for an event code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Unknown,
    FinishedLoadingSync,
    BankFile,
    BankSection,
    BankKey,
    BankValue,
    BankSignature(SignatureLayout),
    UserOptions(UserOptionsLayout),
    SaveGame,
    SaveGameDone,
    LoadGameDone,
    PlayerLeave,
    GameUserJoin,
    GameCheat,
    Command(CommandLayout),
    SelectionDelta(SelectionLayout),
    ControlGroupUpdate(SelectionLayout),
    SelectionSyncCheck(SyncCheckLayout),
    ResourceTrade,
    TriggerChatMessage,
    AiCommunicate(AiLayout),
    SetAbsoluteGameSpeed,
    AddAbsoluteGameSpeed,
    TriggerPing,
    BroadcastCheat,
    Alliance,
    UnitClick,
    UnitHighlight,
    TriggerReplySelected,
    HijackReplayGame,
    TriggerSkipped,
    TriggerSoundLengthQuery,
    TriggerSoundOffset,
    TriggerTransmissionOffset { with_thread: bool },
    TriggerTransmissionComplete,
    CameraSave,
    CameraUpdate(CameraLayout),
    TriggerAbortMission,
    TriggerPurchaseMade,
    TriggerPurchaseExit,
    TriggerPlanetMissionLaunched,
    TriggerPlanetPanelCanceled,
    TriggerDialogControl(DialogLayout),
    TriggerSoundLengthSync(SoundSyncLayout),
    TriggerConversationSkipped,
    TriggerMouseClicked(MouseLayout),
    TriggerMouseMoved(MouseLayout),
    AchievementAwarded,
    TriggerTargetModeUpdate,
    TriggerPlanetPanelReplay,
    TriggerSoundtrackDone,
    TriggerPlanetMissionSelected,
    TriggerKeyPressed,
    TriggerMovieFunction,
    TriggerPlanetPanelBirthComplete,
    TriggerPlanetPanelDeathComplete,
    ResourceRequest,
    ResourceRequestFulfill,
    ResourceRequestCancel,
    TriggerResearchPanelExit,
    TriggerResearchPanelPurchase,
    TriggerResearchPanelSelectionChanged,
    LagMessage,
    TriggerMercenaryPanelExit,
    TriggerMercenaryPanelPurchase,
    TriggerMercenaryPanelSelectionChanged,
    TriggerVictoryPanelExit,
    TriggerBattleReportPanelExit,
    TriggerBattleReportPanelPlayMission,
    TriggerBattleReportPanelPlayScene,
    TriggerBattleReportPanelSelectionChanged,
    TriggerVictoryPanelPlayMissionAgain,
    TriggerMovieStarted,
    TriggerMovieFinished,
    DecrementGameTimeRemaining(DecrementLayout),
    TriggerPortraitLoaded,
    TriggerCustomDialogDismissed,
    TriggerGameMenuItemSelected,
    TriggerCameraMove,
    TriggerPurchasePanelSelectedPurchaseItemChanged,
    TriggerPurchasePanelSelectedPurchaseCategoryChanged,
    TriggerButtonPressed,
    TriggerGameCreditsFinished,
    TriggerCutsceneBookmarkFired,
    TriggerCutsceneEndSceneFired,
    TriggerCutsceneConversationLine,
    TriggerCutsceneConversationLineMissing,
}

/// A known event code. Codes that are not emitted are still parsed so that the stream stays in
/// step, but their records are dropped unless the caller keeps ignored events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub kind: EventKind,
    pub emit: bool,
}

impl Entry {
    const fn emitted(kind: EventKind) -> Self {
        Entry { kind, emit: true }
    }

    const fn ignored(kind: EventKind) -> Self {
        Entry { kind, emit: false }
    }
}

/// One change to the table of the previous threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch {
    /// A code that did not exist before
    Add(u8, Entry),

    /// A code that now parses differently
    Override(u8, Entry),
    Remove(u8),
}

use self::EventKind as K;
use self::Patch::{Add, Override, Remove};

const BASE: &[(u8, Entry)] = &[
    (0, Entry::ignored(K::Unknown)),
    (5, Entry::ignored(K::FinishedLoadingSync)),
    (7, Entry::ignored(K::BankFile)),
    (8, Entry::ignored(K::BankSection)),
    (9, Entry::ignored(K::BankKey)),
    (10, Entry::ignored(K::BankValue)),
    (11, Entry::ignored(K::BankSignature(SignatureLayout::Short))),
    (12, Entry::emitted(K::UserOptions(UserOptionsLayout::Base))),
    (22, Entry::ignored(K::SaveGame)),
    (23, Entry::ignored(K::SaveGameDone)),
    (25, Entry::emitted(K::PlayerLeave)),
    (26, Entry::ignored(K::GameCheat)),
    (27, Entry::emitted(K::Command(CommandLayout::Legacy))),
    (28, Entry::emitted(K::SelectionDelta(SelectionLayout::Legacy))),
    (29, Entry::emitted(K::ControlGroupUpdate(SelectionLayout::Legacy))),
    (30, Entry::ignored(K::SelectionSyncCheck(SyncCheckLayout::Narrow))),
    (31, Entry::ignored(K::ResourceTrade)),
    (32, Entry::ignored(K::TriggerChatMessage)),
    (33, Entry::ignored(K::AiCommunicate(AiLayout::Base))),
    (34, Entry::ignored(K::SetAbsoluteGameSpeed)),
    (35, Entry::ignored(K::AddAbsoluteGameSpeed)),
    (37, Entry::ignored(K::BroadcastCheat)),
    (38, Entry::ignored(K::Alliance)),
    (39, Entry::ignored(K::UnitClick)),
    (40, Entry::ignored(K::UnitHighlight)),
    (41, Entry::ignored(K::TriggerReplySelected)),
    (44, Entry::ignored(K::TriggerSkipped)),
    (45, Entry::ignored(K::TriggerSoundLengthQuery)),
    (46, Entry::ignored(K::TriggerSoundOffset)),
    (47, Entry::ignored(K::TriggerTransmissionOffset { with_thread: false })),
    (48, Entry::ignored(K::TriggerTransmissionComplete)),
    (49, Entry::emitted(K::CameraUpdate(CameraLayout::TargetRequired))),
    (50, Entry::ignored(K::TriggerAbortMission)),
    (51, Entry::ignored(K::TriggerPurchaseMade)),
    (52, Entry::ignored(K::TriggerPurchaseExit)),
    (53, Entry::ignored(K::TriggerPlanetMissionLaunched)),
    (54, Entry::ignored(K::TriggerPlanetPanelCanceled)),
    (55, Entry::ignored(K::TriggerDialogControl(DialogLayout::Base))),
    (56, Entry::ignored(K::TriggerSoundLengthSync(SoundSyncLayout::Bytes))),
    (57, Entry::ignored(K::TriggerConversationSkipped)),
    (58, Entry::ignored(K::TriggerMouseClicked(MouseLayout::Base))),
    (63, Entry::ignored(K::TriggerPlanetPanelReplay)),
    (64, Entry::ignored(K::TriggerSoundtrackDone)),
    (65, Entry::ignored(K::TriggerPlanetMissionSelected)),
    (66, Entry::ignored(K::TriggerKeyPressed)),
    (67, Entry::ignored(K::TriggerMovieFunction)),
    (68, Entry::ignored(K::TriggerPlanetPanelBirthComplete)),
    (69, Entry::ignored(K::TriggerPlanetPanelDeathComplete)),
    (70, Entry::ignored(K::ResourceRequest)),
    (71, Entry::ignored(K::ResourceRequestFulfill)),
    (72, Entry::ignored(K::ResourceRequestCancel)),
    (73, Entry::ignored(K::TriggerResearchPanelExit)),
    (74, Entry::ignored(K::TriggerResearchPanelPurchase)),
    (75, Entry::ignored(K::TriggerResearchPanelSelectionChanged)),
    (76, Entry::ignored(K::LagMessage)),
    (77, Entry::ignored(K::TriggerMercenaryPanelExit)),
    (78, Entry::ignored(K::TriggerMercenaryPanelPurchase)),
    (79, Entry::ignored(K::TriggerMercenaryPanelSelectionChanged)),
    (80, Entry::ignored(K::TriggerVictoryPanelExit)),
    (81, Entry::ignored(K::TriggerBattleReportPanelExit)),
    (82, Entry::ignored(K::TriggerBattleReportPanelPlayMission)),
    (83, Entry::ignored(K::TriggerBattleReportPanelPlayScene)),
    (84, Entry::ignored(K::TriggerBattleReportPanelSelectionChanged)),
    (85, Entry::ignored(K::TriggerVictoryPanelPlayMissionAgain)),
    (86, Entry::ignored(K::TriggerMovieStarted)),
    (87, Entry::ignored(K::TriggerMovieFinished)),
    (88, Entry::ignored(K::DecrementGameTimeRemaining(DecrementLayout::Bits32))),
    (89, Entry::ignored(K::TriggerPortraitLoaded)),
    (90, Entry::ignored(K::TriggerCustomDialogDismissed)),
    (91, Entry::ignored(K::TriggerGameMenuItemSelected)),
    (92, Entry::ignored(K::TriggerCameraMove)),
    (93, Entry::ignored(K::TriggerPurchasePanelSelectedPurchaseItemChanged)),
    (94, Entry::ignored(K::TriggerPurchasePanelSelectedPurchaseCategoryChanged)),
    (95, Entry::ignored(K::TriggerButtonPressed)),
    (96, Entry::ignored(K::TriggerGameCreditsFinished)),
];

const V16561: &[Patch] = &[
    Override(27, Entry::emitted(K::Command(CommandLayout::Flags17))),
    Override(28, Entry::emitted(K::SelectionDelta(SelectionLayout::Choice))),
    Override(29, Entry::emitted(K::ControlGroupUpdate(SelectionLayout::Choice))),
    Override(88, Entry::ignored(K::DecrementGameTimeRemaining(DecrementLayout::Bits19))),
];

const V17326: &[Patch] = &[
    Override(11, Entry::ignored(K::BankSignature(SignatureLayout::Long))),
    Override(58, Entry::ignored(K::TriggerMouseClicked(MouseLayout::Packed))),
    Add(59, Entry::ignored(K::TriggerMouseMoved(MouseLayout::Packed))),
];

const V18574: &[Patch] = &[Override(
    27,
    Entry::emitted(K::Command(CommandLayout::Flags18)),
)];

const V19595: &[Patch] = &[
    Override(27, Entry::emitted(K::Command(CommandLayout::Flags18Control))),
    Override(33, Entry::ignored(K::AiCommunicate(AiLayout::V19595))),
];

const V22612: &[Patch] = &[
    Override(12, Entry::emitted(K::UserOptions(UserOptionsLayout::V22612))),
    Override(27, Entry::emitted(K::Command(CommandLayout::Flags20))),
    Override(28, Entry::emitted(K::SelectionDelta(SelectionLayout::Wide))),
    Override(29, Entry::emitted(K::ControlGroupUpdate(SelectionLayout::Wide))),
    Override(30, Entry::ignored(K::SelectionSyncCheck(SyncCheckLayout::Wide))),
    Override(33, Entry::ignored(K::AiCommunicate(AiLayout::V22612))),
    Add(36, Entry::ignored(K::TriggerPing)),
    Override(47, Entry::ignored(K::TriggerTransmissionOffset { with_thread: true })),
    Add(60, Entry::ignored(K::AchievementAwarded)),
    Add(97, Entry::ignored(K::TriggerCutsceneBookmarkFired)),
    Add(98, Entry::ignored(K::TriggerCutsceneEndSceneFired)),
    Add(99, Entry::ignored(K::TriggerCutsceneConversationLine)),
    Add(100, Entry::ignored(K::TriggerCutsceneConversationLineMissing)),
];

const V23260: &[Patch] = &[
    Override(12, Entry::emitted(K::UserOptions(UserOptionsLayout::V23260))),
    Override(56, Entry::ignored(K::TriggerSoundLengthSync(SoundSyncLayout::Bits7))),
];

const HOTS_BETA: &[Patch] = &[
    Override(12, Entry::emitted(K::UserOptions(UserOptionsLayout::HotsBeta))),
    Override(28, Entry::emitted(K::SelectionDelta(SelectionLayout::WidePriority))),
    Override(49, Entry::emitted(K::CameraUpdate(CameraLayout::TargetOptional))),
    Override(55, Entry::ignored(K::TriggerDialogControl(DialogLayout::MouseButton))),
];

// The bank events and user options all moved to new codes
const V24247: &[Patch] = &[
    Override(7, Entry::emitted(K::UserOptions(UserOptionsLayout::HotsBeta))),
    Remove(8),
    Override(9, Entry::ignored(K::BankFile)),
    Override(10, Entry::ignored(K::BankSection)),
    Override(11, Entry::ignored(K::BankKey)),
    Override(12, Entry::ignored(K::BankValue)),
    Add(13, Entry::ignored(K::BankSignature(SignatureLayout::WithToon))),
    Add(14, Entry::ignored(K::CameraSave)),
    Add(21, Entry::ignored(K::SaveGame)),
    Override(22, Entry::ignored(K::SaveGameDone)),
    Override(23, Entry::ignored(K::LoadGameDone)),
    Remove(25),
    Add(43, Entry::ignored(K::HijackReplayGame)),
    Add(62, Entry::ignored(K::TriggerTargetModeUpdate)),
    Remove(76),
    Add(101, Entry::emitted(K::PlayerLeave)),
    Add(102, Entry::ignored(K::GameUserJoin)),
];

const V26490: &[Patch] = &[
    Override(58, Entry::ignored(K::TriggerMouseClicked(MouseLayout::Flagged))),
    Override(59, Entry::ignored(K::TriggerMouseMoved(MouseLayout::Flagged))),
];

/// Patches in ascending threshold order. Builds without layout changes of their own still
/// get an entry so that every known build resolves to a named threshold.
pub(crate) const REVISIONS: &[(u32, Line, &[Patch])] = &[
    (16561, Line::Any, V16561),
    (16605, Line::Any, &[]),
    (16755, Line::Any, &[]),
    (16939, Line::Any, &[]),
    (17326, Line::Any, V17326),
    (18092, Line::Any, &[]),
    (18574, Line::Any, V18574),
    (19132, Line::Any, &[]),
    (19595, Line::Any, V19595),
    (21029, Line::Any, &[]),
    (22612, Line::Any, V22612),
    (23260, Line::Any, V23260),
    (23925, Line::Hots, HOTS_BETA),
    (24247, Line::Hots, V24247),
    (26490, Line::Hots, V26490),
];

pub(crate) const BASE_BUILD: u32 = 15405;

fn apply(table: &mut DispatchTable, patches: &[Patch]) {
    for patch in patches {
        match *patch {
            Add(code, entry) | Override(code, entry) => {
                table.insert(code, entry);
            }
            Remove(code) => {
                table.remove(&code);
            }
        }
    }
}

/// Reports the first patch that adds a code that already exists, or overrides or removes one
/// that does not
pub(crate) fn check_patches(base: &DispatchTable, patches: &[Patch]) -> Result<(), Patch> {
    for patch in patches {
        let valid = match *patch {
            Add(code, _) => !base.contains_key(&code),
            Override(code, _) | Remove(code) => base.contains_key(&code),
        };

        if !valid {
            return Err(*patch);
        }
    }
    Ok(())
}

pub(crate) fn base_table() -> DispatchTable {
    BASE.iter().copied().collect()
}

/// Dispatch tables of every threshold
pub fn schemas() -> &'static SchemaTable<DispatchTable> {
    static TABLE: OnceLock<SchemaTable<DispatchTable>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut current = base_table();
        let mut entries = vec![(BASE_BUILD, Line::Any, current.clone())];

        // HotS-only revisions come last, so no shared revision is folded over one
        for &(build, line, patches) in REVISIONS {
            apply(&mut current, patches);
            entries.push((build, line, current.clone()));
        }
        SchemaTable::new(StreamKind::GameEvents, entries)
    })
}
