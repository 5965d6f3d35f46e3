use crate::models::Versioned;
use crate::selection::SelectionMask;
use serde::Serialize;

/// One player or system action from the game event stream
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct GameEvent {
    pub frame: u64,
    pub player: u8,

    /// Event type as written in the stream. The same code can mean different events in
    /// different builds, so `data` is what identifies the event.
    pub code: u8,
    pub data: GameEventData,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawSpan>,
}

/// Location of an event within the stream, captured when decoding in debug mode
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct RawSpan {
    pub start_bit: usize,
    pub end_bit: usize,
    pub bytes: Vec<u8>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct Point2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct Point3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Screen coordinates
#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct UiPoint {
    pub x: u32,
    pub y: u32,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct CameraTarget {
    pub x: u16,
    pub y: u16,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct UserOptions {
    pub game_fully_downloaded: Versioned<bool>,
    pub development_cheats_enabled: bool,
    pub multiplayer_cheats_enabled: bool,
    pub sync_checksumming_enabled: bool,
    pub is_map_to_map_transition: bool,
    pub starting_rally: Versioned<bool>,
    pub use_ai_beacons: Versioned<bool>,
    pub base_build_num: Versioned<u32>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct Ability {
    pub ability_link: u16,
    pub ability_command_index: u8,
    pub ability_command_data: Option<u8>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct TargetUnit {
    pub flags: u8,
    pub timer: u8,
    pub unit_tag: u32,
    pub unit_link: u16,
    pub control_player_id: Versioned<Option<u8>>,
    pub upkeep_player_id: Option<u8>,
    pub point: Point3,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub enum CommandData {
    None,
    TargetPoint(Point3),
    TargetUnit(TargetUnit),
    Data(u32),
}

/// An ability issued to the selected units
#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct Command {
    pub flags: u32,
    pub ability: Option<Ability>,
    pub data: CommandData,
    pub other_unit_tag: Option<u32>,
}

/// Which units leave a selection
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub enum RemoveMask {
    None,
    Mask(SelectionMask),
    OneIndices(Vec<u16>),
    ZeroIndices(Vec<u16>),
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct Subgroup {
    pub unit_link: u16,
    pub subgroup_priority: Versioned<u8>,
    pub intra_subgroup_priority: u8,
    pub count: u16,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct SelectionDelta {
    pub control_group_index: u8,
    pub subgroup_index: u16,
    pub remove_mask: RemoveMask,
    pub add_subgroups: Vec<Subgroup>,
    pub add_unit_tags: Vec<u32>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct ControlGroupUpdate {
    pub control_group_index: u8,

    /// Whether the group was set, added to, selected, or cleared
    pub control_group_update: u8,
    pub remove_mask: RemoveMask,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct SelectionSyncCheck {
    pub control_group_index: u8,
    pub count: u16,
    pub subgroup_count: u16,
    pub active_subgroup_index: u16,
    pub unit_tags_checksum: u32,
    pub subgroup_indices_checksum: u32,
    pub subgroups_checksum: u32,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct AiCommunicate {
    pub beacon: i8,
    pub ally: i8,
    pub flags: i8,
    pub build: Versioned<i8>,
    pub target_unit_tag: u32,
    pub target_unit_link: u16,
    pub target_upkeep_player_id: Option<u8>,
    pub target_control_player_id: Versioned<Option<u8>>,
    pub target_point: Point3,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct CameraUpdate {
    pub target: Option<CameraTarget>,
    pub distance: Option<u16>,
    pub pitch: Option<u16>,
    pub yaw: Option<u16>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub enum DialogEvent {
    None,
    Checked(bool),
    ValueChanged(u32),
    SelectionChanged(i32),
    TextChanged(String),
    MouseButton(u32),
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct MouseClicked {
    pub button: u32,
    pub down: bool,
    pub position_ui: UiPoint,
    pub position_world: Point3,
    pub flags: Versioned<i8>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct MouseMoved {
    pub position_ui: UiPoint,
    pub position_world: Point3,
    pub flags: Versioned<i8>,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct SaveGame {
    pub file_name: String,
    pub automatic: bool,
    pub overwrite: bool,
    pub name: String,
    pub description: String,
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub struct HijackUser {
    pub game_unit_id: u8,
    pub observe: u8,
    pub name: String,
    pub toon_handle: Option<String>,
    pub clan_tag: Option<String>,
}

/// Payload of a game event, named after the event
#[derive(Serialize, PartialEq, Eq, Debug, Clone)]
pub enum GameEventData {
    Unknown {
        data: Vec<u8>,
    },
    FinishedLoadingSync,
    BankFile {
        name: String,
    },
    BankSection {
        name: String,
    },
    BankKey {
        name: String,
        kind: u32,
        data: Vec<u8>,
    },
    BankValue {
        kind: u32,
        name: String,
        data: Vec<u8>,
    },
    BankSignature {
        signature: Vec<u8>,
        toon_handle: Versioned<String>,
    },
    UserOptions(UserOptions),
    SaveGame(SaveGame),
    SaveGameDone,
    LoadGameDone,
    PlayerLeave,
    GameUserJoin {
        observe: u8,
        name: String,
        toon_handle: Option<String>,
        clan_tag: Option<String>,
    },
    GameCheat {
        point: Point2,
        time: i32,
        verb: String,
        arguments: String,
    },
    Command(Command),
    SelectionDelta(SelectionDelta),
    ControlGroupUpdate(ControlGroupUpdate),
    SelectionSyncCheck(SelectionSyncCheck),
    ResourceTrade {
        recipient_id: u8,
        resources: Vec<i32>,
    },
    TriggerChatMessage {
        message: String,
    },
    AiCommunicate(AiCommunicate),
    SetAbsoluteGameSpeed {
        speed: u8,
    },
    AddAbsoluteGameSpeed {
        delta: i8,
    },
    TriggerPing {
        point: Point2,
        unit_tag: u32,
        pinged_minimap: bool,
    },
    BroadcastCheat {
        verb: String,
        arguments: String,
    },
    Alliance {
        alliance: u32,
        control: u32,
    },
    UnitClick {
        unit_tag: u32,
    },
    UnitHighlight {
        unit_tag: u32,
        flags: u8,
    },
    TriggerReplySelected {
        conversation_id: i32,
        reply_id: i32,
    },
    HijackReplayGame {
        user_infos: Vec<HijackUser>,
        method: u8,
    },
    TriggerSkipped,
    TriggerSoundLengthQuery {
        sound_hash: u32,
        length: u32,
    },
    TriggerSoundOffset {
        sound: u32,
    },
    TriggerTransmissionOffset {
        transmission_id: i32,
        thread: Versioned<u32>,
    },
    TriggerTransmissionComplete {
        transmission_id: i32,
    },
    CameraSave {
        which: u8,
        target: CameraTarget,
    },
    CameraUpdate(CameraUpdate),
    TriggerAbortMission,
    TriggerPurchaseMade {
        purchase_item_id: i32,
    },
    TriggerPurchaseExit,
    TriggerPlanetMissionLaunched {
        difficulty_level: i32,
    },
    TriggerPlanetPanelCanceled,
    TriggerDialogControl {
        control_id: i32,
        event_type: i32,
        event_data: DialogEvent,
    },
    TriggerSoundLengthSync {
        sound_hash: Vec<u32>,
        length: Vec<u32>,
    },
    TriggerConversationSkipped {
        skip_type: i8,
    },
    TriggerMouseClicked(MouseClicked),
    TriggerMouseMoved(MouseMoved),
    AchievementAwarded {
        achievement_link: u16,
    },
    TriggerTargetModeUpdate {
        ability_link: u16,
        ability_command_index: u8,
        state: i8,
    },
    TriggerPlanetPanelReplay,
    TriggerSoundtrackDone {
        soundtrack: u32,
    },
    TriggerPlanetMissionSelected {
        planet_id: i32,
    },
    TriggerKeyPressed {
        key: i8,
        flags: i8,
    },
    TriggerMovieFunction {
        function_name: String,
    },
    TriggerPlanetPanelBirthComplete,
    TriggerPlanetPanelDeathComplete,
    ResourceRequest {
        resources: Vec<i32>,
    },
    ResourceRequestFulfill {
        request_id: i32,
    },
    ResourceRequestCancel {
        request_id: i32,
    },
    TriggerResearchPanelExit,
    TriggerResearchPanelPurchase,
    TriggerResearchPanelSelectionChanged {
        item_id: i32,
    },
    LagMessage {
        player_id: u8,
    },
    TriggerMercenaryPanelExit,
    TriggerMercenaryPanelPurchase,
    TriggerMercenaryPanelSelectionChanged {
        item_id: i32,
    },
    TriggerVictoryPanelExit,
    TriggerBattleReportPanelExit,
    TriggerBattleReportPanelPlayMission {
        battle_report_id: i32,
        difficulty_level: i32,
    },
    TriggerBattleReportPanelPlayScene {
        battle_report_id: i32,
    },
    TriggerBattleReportPanelSelectionChanged {
        battle_report_id: i32,
    },
    TriggerVictoryPanelPlayMissionAgain {
        difficulty_level: i32,
    },
    TriggerMovieStarted,
    TriggerMovieFinished,
    DecrementGameTimeRemaining {
        decrement_ms: u32,
    },
    TriggerPortraitLoaded {
        portrait_id: i32,
    },
    TriggerCustomDialogDismissed {
        result: i32,
    },
    TriggerGameMenuItemSelected {
        game_menu_item_index: i32,
    },
    TriggerCameraMove {
        reason: i8,
    },
    TriggerPurchasePanelSelectedPurchaseItemChanged {
        item_id: i32,
    },
    TriggerPurchasePanelSelectedPurchaseCategoryChanged {
        category_id: i32,
    },
    TriggerButtonPressed {
        button: u16,
    },
    TriggerGameCreditsFinished,
    TriggerCutsceneBookmarkFired {
        cutscene_id: i32,
        bookmark_name: String,
    },
    TriggerCutsceneEndSceneFired {
        cutscene_id: i32,
    },
    TriggerCutsceneConversationLine {
        cutscene_id: i32,
        conversation_line: String,
        alt_conversation_line: String,
    },
    TriggerCutsceneConversationLineMissing {
        cutscene_id: i32,
        conversation_line: String,
    },
}
