use super::dispatch::{
    AiLayout, CameraLayout, CommandLayout, DecrementLayout, DialogLayout, EventKind,
    MouseLayout, SelectionLayout, SignatureLayout, SoundSyncLayout, SyncCheckLayout,
    UserOptionsLayout,
};
use super::models::*;
use crate::bits::BitReader;
use crate::errors::DecodeError;
use crate::models::Versioned;
use crate::selection::SelectionMask;

type Res<T> = Result<T, DecodeError>;

fn text(bits: &mut BitReader<'_>, len_bits: u32) -> Res<String> {
    let len = bits.read_bits(len_bits)? as usize;
    bits.read_aligned_string(len)
}

fn blob(bits: &mut BitReader<'_>, len_bits: u32) -> Res<Vec<u8>> {
    let len = bits.read_bits(len_bits)? as usize;
    bits.read_aligned_bytes(len).map(|x| x.to_vec())
}

/// Reads a choice tag along with the position it started at
fn choice(bits: &mut BitReader<'_>, width: u32) -> Res<(u64, usize)> {
    let bit_pos = bits.tell();
    let tag = bits.read_bits(width)?;
    Ok((tag, bit_pos))
}

fn invalid(field: &'static str, tag: u64, bit_pos: usize) -> DecodeError {
    DecodeError::InvalidChoice {
        field,
        tag,
        bit_pos,
    }
}

fn point2(bits: &mut BitReader<'_>) -> Res<Point2> {
    Ok(Point2 {
        x: bits.read_signed_offset32()?,
        y: bits.read_signed_offset32()?,
    })
}

fn point3(bits: &mut BitReader<'_>) -> Res<Point3> {
    Ok(Point3 {
        x: bits.read_signed_offset32()?,
        y: bits.read_signed_offset32()?,
        z: bits.read_signed_offset32()?,
    })
}

/// Map coordinates as two 20 bit values followed by a full height
fn packed_point3(bits: &mut BitReader<'_>) -> Res<Point3> {
    Ok(Point3 {
        x: bits.read_bits(20)? as i32,
        y: bits.read_bits(20)? as i32,
        z: bits.read_signed_offset32()?,
    })
}

fn camera_target(bits: &mut BitReader<'_>) -> Res<CameraTarget> {
    Ok(CameraTarget {
        x: bits.read_u16()?,
        y: bits.read_u16()?,
    })
}

fn player_id(bits: &mut BitReader<'_>) -> Res<u8> {
    bits.read_bits(4).map(|x| x as u8)
}

fn user_options(bits: &mut BitReader<'_>, layout: UserOptionsLayout) -> Res<UserOptions> {
    use UserOptionsLayout::*;
    let game_fully_downloaded = Versioned::when(layout >= V22612, || bits.read_bool())?;
    let development_cheats_enabled = bits.read_bool()?;
    let multiplayer_cheats_enabled = bits.read_bool()?;
    let sync_checksumming_enabled = bits.read_bool()?;
    let is_map_to_map_transition = bits.read_bool()?;
    let starting_rally = Versioned::when(layout >= V23260, || bits.read_bool())?;
    let use_ai_beacons = Versioned::when(layout == V22612 || layout == V23260, || {
        bits.read_bool()
    })?;
    let base_build_num = Versioned::when(layout == HotsBeta, || bits.read_u32())?;

    Ok(UserOptions {
        game_fully_downloaded,
        development_cheats_enabled,
        multiplayer_cheats_enabled,
        sync_checksumming_enabled,
        is_map_to_map_transition,
        starting_rally,
        use_ai_beacons,
        base_build_num,
    })
}

fn legacy_command(bits: &mut BitReader<'_>) -> Res<Command> {
    let flags = bits.read_u32()?;
    let ability = Ability {
        ability_link: bits.read_u16()?,
        ability_command_index: bits.read_u8()?,
        ability_command_data: Some(bits.read_u8()?),
    };

    let target_flags = bits.read_u8()?;
    let timer = bits.read_u8()?;
    let other_unit_tag = bits.read_u32()?;
    let target = TargetUnit {
        flags: target_flags,
        timer,
        unit_tag: bits.read_u32()?,
        unit_link: bits.read_u16()?,
        control_player_id: Versioned::Missing,
        upkeep_player_id: bits.if_get(player_id)?,
        point: point3(bits)?,
    };

    Ok(Command {
        flags,
        ability: Some(ability),
        data: CommandData::TargetUnit(target),
        other_unit_tag: Some(other_unit_tag),
    })
}

fn command(bits: &mut BitReader<'_>, layout: CommandLayout) -> Res<Command> {
    let flag_bits = match layout {
        CommandLayout::Legacy => return legacy_command(bits),
        CommandLayout::Flags17 => 17,
        CommandLayout::Flags18 | CommandLayout::Flags18Control => 18,
        CommandLayout::Flags20 => 20,
    };
    let with_control = layout >= CommandLayout::Flags18Control;

    let flags = bits.read_bits(flag_bits)? as u32;
    let ability = bits.if_get(|b| {
        Ok(Ability {
            ability_link: b.read_u16()?,
            ability_command_index: b.read_bits(5)? as u8,
            ability_command_data: b.if_get(|b| b.read_u8())?,
        })
    })?;

    let (tag, bit_pos) = choice(bits, 2)?;
    let data = match tag {
        0 => CommandData::None,
        1 => CommandData::TargetPoint(packed_point3(bits)?),
        2 => CommandData::TargetUnit(TargetUnit {
            flags: bits.read_u8()?,
            timer: bits.read_u8()?,
            unit_tag: bits.read_u32()?,
            unit_link: bits.read_u16()?,
            control_player_id: Versioned::when(with_control, || bits.if_get(player_id))?,
            upkeep_player_id: bits.if_get(player_id)?,
            point: packed_point3(bits)?,
        }),
        3 => CommandData::Data(bits.read_u32()?),
        x => return Err(invalid("command data", x, bit_pos)),
    };

    Ok(Command {
        flags,
        ability,
        data,
        other_unit_tag: bits.if_get(|b| b.read_u32())?,
    })
}

fn indices(bits: &mut BitReader<'_>, width: u32) -> Res<Vec<u16>> {
    bits.list_of(width, |b| Ok(b.read_bits(width)? as u16))
}

fn remove_mask(bits: &mut BitReader<'_>, layout: SelectionLayout) -> Res<RemoveMask> {
    let width = if layout >= SelectionLayout::Wide { 9 } else { 8 };
    let (tag, bit_pos) = choice(bits, 2)?;
    match tag {
        0 => Ok(RemoveMask::None),
        1 => {
            let len = bits.read_bits(width)? as u32;
            SelectionMask::read(bits, len).map(RemoveMask::Mask)
        }
        2 => indices(bits, width).map(RemoveMask::OneIndices),
        3 => indices(bits, width).map(RemoveMask::ZeroIndices),
        x => Err(invalid("remove mask", x, bit_pos)),
    }
}

fn selection_delta(bits: &mut BitReader<'_>, layout: SelectionLayout) -> Res<SelectionDelta> {
    let wide = layout >= SelectionLayout::Wide;
    let width = if wide { 9 } else { 8 };

    let control_group_index = bits.read_bits(4)? as u8;
    let subgroup_index = bits.read_bits(width)? as u16;
    let remove_mask = if layout == SelectionLayout::Legacy {
        let len = bits.read_u8()?;
        RemoveMask::Mask(SelectionMask::read(bits, u32::from(len))?)
    } else {
        remove_mask(bits, layout)?
    };

    let add_subgroups = bits.list_of(width, |b| {
        Ok(Subgroup {
            unit_link: b.read_u16()?,
            subgroup_priority: Versioned::when(layout == SelectionLayout::WidePriority, || {
                b.read_u8()
            })?,
            intra_subgroup_priority: b.read_u8()?,
            count: b.read_bits(width)? as u16,
        })
    })?;

    Ok(SelectionDelta {
        control_group_index,
        subgroup_index,
        remove_mask,
        add_subgroups,
        add_unit_tags: bits.list_of(width, |b| b.read_u32())?,
    })
}

fn control_group_update(
    bits: &mut BitReader<'_>,
    layout: SelectionLayout,
) -> Res<ControlGroupUpdate> {
    let control_group_index = bits.read_bits(4)? as u8;
    let control_group_update = bits.read_bits(2)? as u8;
    let remove_mask = if layout == SelectionLayout::Legacy {
        match bits.if_get(|b| {
            let len = b.read_u8()?;
            SelectionMask::read(b, u32::from(len))
        })? {
            Some(mask) => RemoveMask::Mask(mask),
            None => RemoveMask::None,
        }
    } else {
        remove_mask(bits, layout)?
    };

    Ok(ControlGroupUpdate {
        control_group_index,
        control_group_update,
        remove_mask,
    })
}

fn selection_sync_check(
    bits: &mut BitReader<'_>,
    layout: SyncCheckLayout,
) -> Res<SelectionSyncCheck> {
    let width = match layout {
        SyncCheckLayout::Narrow => 8,
        SyncCheckLayout::Wide => 9,
    };

    Ok(SelectionSyncCheck {
        control_group_index: bits.read_bits(4)? as u8,
        count: bits.read_bits(width)? as u16,
        subgroup_count: bits.read_bits(width)? as u16,
        active_subgroup_index: bits.read_bits(width)? as u16,
        unit_tags_checksum: bits.read_u32()?,
        subgroup_indices_checksum: bits.read_u32()?,
        subgroups_checksum: bits.read_u32()?,
    })
}

fn ai_communicate(bits: &mut BitReader<'_>, layout: AiLayout) -> Res<AiCommunicate> {
    let beacon = bits.read_signed_offset8()?;
    let ally = bits.read_signed_offset8()?;
    let flags = bits.read_signed_offset8()?;
    let build = Versioned::when(layout == AiLayout::V22612, || bits.read_signed_offset8())?;
    let target_unit_tag = bits.read_u32()?;
    let target_unit_link = bits.read_u16()?;

    let (target_upkeep_player_id, target_control_player_id) = match layout {
        AiLayout::Base => (bits.if_get(player_id)?, Versioned::Missing),
        AiLayout::V19595 => {
            let upkeep = bits.if_get(player_id)?;
            (upkeep, Versioned::Present(bits.if_get(player_id)?))
        }
        AiLayout::V22612 => {
            let upkeep = bits.read_u8()?;
            (Some(upkeep), Versioned::Present(Some(bits.read_u8()?)))
        }
    };

    Ok(AiCommunicate {
        beacon,
        ally,
        flags,
        build,
        target_unit_tag,
        target_unit_link,
        target_upkeep_player_id,
        target_control_player_id,
        target_point: point3(bits)?,
    })
}

fn camera_update(bits: &mut BitReader<'_>, layout: CameraLayout) -> Res<CameraUpdate> {
    let target = match layout {
        CameraLayout::TargetRequired => Some(camera_target(bits)?),
        CameraLayout::TargetOptional => bits.if_get(camera_target)?,
    };

    Ok(CameraUpdate {
        target,
        distance: bits.if_get(|b| b.read_u16())?,
        pitch: bits.if_get(|b| b.read_u16())?,
        yaw: bits.if_get(|b| b.read_u16())?,
    })
}

fn dialog_event(bits: &mut BitReader<'_>, layout: DialogLayout) -> Res<DialogEvent> {
    let (tag, bit_pos) = choice(bits, 3)?;
    match tag {
        0 => Ok(DialogEvent::None),
        1 => bits.read_bool().map(DialogEvent::Checked),
        2 => bits.read_u32().map(DialogEvent::ValueChanged),
        3 => bits.read_signed_offset32().map(DialogEvent::SelectionChanged),
        4 => text(bits, 11).map(DialogEvent::TextChanged),
        5 if layout == DialogLayout::MouseButton => bits.read_u32().map(DialogEvent::MouseButton),
        x => Err(invalid("dialog event", x, bit_pos)),
    }
}

fn ui_point(bits: &mut BitReader<'_>, layout: MouseLayout) -> Res<UiPoint> {
    let width = if layout == MouseLayout::Packed { 11 } else { 32 };
    Ok(UiPoint {
        x: bits.read_bits(width)? as u32,
        y: bits.read_bits(width)? as u32,
    })
}

fn mouse_clicked(bits: &mut BitReader<'_>, layout: MouseLayout) -> Res<MouseClicked> {
    let button = bits.read_u32()?;
    let down = bits.read_bool()?;

    // the flagged layout went back to full width positions for clicks
    let position_ui = ui_point(bits, layout)?;
    let position_world = match layout {
        MouseLayout::Packed => packed_point3(bits)?,
        MouseLayout::Base | MouseLayout::Flagged => point3(bits)?,
    };

    Ok(MouseClicked {
        button,
        down,
        position_ui,
        position_world,
        flags: Versioned::when(layout == MouseLayout::Flagged, || bits.read_signed_offset8())?,
    })
}

fn mouse_moved(bits: &mut BitReader<'_>, layout: MouseLayout) -> Res<MouseMoved> {
    Ok(MouseMoved {
        position_ui: ui_point(bits, MouseLayout::Packed)?,
        position_world: packed_point3(bits)?,
        flags: Versioned::when(layout == MouseLayout::Flagged, || bits.read_signed_offset8())?,
    })
}

fn save_game(bits: &mut BitReader<'_>) -> Res<SaveGame> {
    Ok(SaveGame {
        file_name: text(bits, 11)?,
        automatic: bits.read_bool()?,
        overwrite: bits.read_bool()?,
        name: text(bits, 8)?,
        description: text(bits, 10)?,
    })
}

fn hijack_user(bits: &mut BitReader<'_>) -> Res<HijackUser> {
    Ok(HijackUser {
        game_unit_id: bits.read_bits(4)? as u8,
        observe: bits.read_bits(2)? as u8,
        name: text(bits, 8)?,
        toon_handle: bits.if_get(|b| text(b, 7))?,
        clan_tag: bits.if_get(|b| text(b, 8))?,
    })
}

fn resources(bits: &mut BitReader<'_>) -> Res<Vec<i32>> {
    bits.list_of(3, |b| b.read_signed_offset32())
}

/// Reads the payload of an event whose header has already been consumed
pub(crate) fn read_payload(kind: EventKind, bits: &mut BitReader<'_>) -> Res<GameEventData> {
    use GameEventData as D;

    let res = match kind {
        EventKind::Unknown => D::Unknown {
            data: bits.read_bytes(2)?,
        },
        EventKind::FinishedLoadingSync => D::FinishedLoadingSync,
        EventKind::BankFile => D::BankFile {
            name: text(bits, 7)?,
        },
        EventKind::BankSection => D::BankSection {
            name: text(bits, 6)?,
        },
        EventKind::BankKey => D::BankKey {
            name: text(bits, 6)?,
            kind: bits.read_u32()?,
            data: blob(bits, 7)?,
        },
        EventKind::BankValue => D::BankValue {
            kind: bits.read_u32()?,
            name: text(bits, 6)?,
            data: blob(bits, 12)?,
        },
        EventKind::BankSignature(layout) => {
            let count_bits = if layout == SignatureLayout::Short { 4 } else { 5 };
            D::BankSignature {
                signature: bits.list_of(count_bits, |b| b.read_u8())?,
                toon_handle: Versioned::when(layout == SignatureLayout::WithToon, || {
                    text(bits, 7)
                })?,
            }
        }
        EventKind::UserOptions(layout) => D::UserOptions(user_options(bits, layout)?),
        EventKind::SaveGame => D::SaveGame(save_game(bits)?),
        EventKind::SaveGameDone => D::SaveGameDone,
        EventKind::LoadGameDone => D::LoadGameDone,
        EventKind::PlayerLeave => D::PlayerLeave,
        EventKind::GameUserJoin => D::GameUserJoin {
            observe: bits.read_bits(2)? as u8,
            name: text(bits, 8)?,
            toon_handle: bits.if_get(|b| text(b, 7))?,
            clan_tag: bits.if_get(|b| text(b, 8))?,
        },
        EventKind::GameCheat => D::GameCheat {
            point: point2(bits)?,
            time: bits.read_signed_offset32()?,
            verb: text(bits, 10)?,
            arguments: text(bits, 10)?,
        },
        EventKind::Command(layout) => D::Command(command(bits, layout)?),
        EventKind::SelectionDelta(layout) => D::SelectionDelta(selection_delta(bits, layout)?),
        EventKind::ControlGroupUpdate(layout) => {
            D::ControlGroupUpdate(control_group_update(bits, layout)?)
        }
        EventKind::SelectionSyncCheck(layout) => {
            D::SelectionSyncCheck(selection_sync_check(bits, layout)?)
        }
        EventKind::ResourceTrade => D::ResourceTrade {
            recipient_id: player_id(bits)?,
            resources: resources(bits)?,
        },
        EventKind::TriggerChatMessage => D::TriggerChatMessage {
            message: text(bits, 10)?,
        },
        EventKind::AiCommunicate(layout) => D::AiCommunicate(ai_communicate(bits, layout)?),
        EventKind::SetAbsoluteGameSpeed => D::SetAbsoluteGameSpeed {
            speed: bits.read_bits(3)? as u8,
        },
        EventKind::AddAbsoluteGameSpeed => D::AddAbsoluteGameSpeed {
            delta: bits.read_signed_offset8()?,
        },
        EventKind::TriggerPing => D::TriggerPing {
            point: point2(bits)?,
            unit_tag: bits.read_u32()?,
            pinged_minimap: bits.read_bool()?,
        },
        EventKind::BroadcastCheat => D::BroadcastCheat {
            verb: text(bits, 10)?,
            arguments: text(bits, 10)?,
        },
        EventKind::Alliance => D::Alliance {
            alliance: bits.read_u32()?,
            control: bits.read_u32()?,
        },
        EventKind::UnitClick => D::UnitClick {
            unit_tag: bits.read_u32()?,
        },
        EventKind::UnitHighlight => D::UnitHighlight {
            unit_tag: bits.read_u32()?,
            flags: bits.read_u8()?,
        },
        EventKind::TriggerReplySelected => D::TriggerReplySelected {
            conversation_id: bits.read_signed_offset32()?,
            reply_id: bits.read_signed_offset32()?,
        },
        EventKind::HijackReplayGame => D::HijackReplayGame {
            user_infos: bits.list_of(5, hijack_user)?,
            method: bits.read_bits(1)? as u8,
        },
        EventKind::TriggerSkipped => D::TriggerSkipped,
        EventKind::TriggerSoundLengthQuery => D::TriggerSoundLengthQuery {
            sound_hash: bits.read_u32()?,
            length: bits.read_u32()?,
        },
        EventKind::TriggerSoundOffset => D::TriggerSoundOffset {
            sound: bits.read_u32()?,
        },
        EventKind::TriggerTransmissionOffset { with_thread } => D::TriggerTransmissionOffset {
            transmission_id: bits.read_signed_offset32()?,
            thread: Versioned::when(with_thread, || bits.read_u32())?,
        },
        EventKind::TriggerTransmissionComplete => D::TriggerTransmissionComplete {
            transmission_id: bits.read_signed_offset32()?,
        },
        EventKind::CameraSave => D::CameraSave {
            which: bits.read_bits(3)? as u8,
            target: camera_target(bits)?,
        },
        EventKind::CameraUpdate(layout) => D::CameraUpdate(camera_update(bits, layout)?),
        EventKind::TriggerAbortMission => D::TriggerAbortMission,
        EventKind::TriggerPurchaseMade => D::TriggerPurchaseMade {
            purchase_item_id: bits.read_signed_offset32()?,
        },
        EventKind::TriggerPurchaseExit => D::TriggerPurchaseExit,
        EventKind::TriggerPlanetMissionLaunched => D::TriggerPlanetMissionLaunched {
            difficulty_level: bits.read_signed_offset32()?,
        },
        EventKind::TriggerPlanetPanelCanceled => D::TriggerPlanetPanelCanceled,
        EventKind::TriggerDialogControl(layout) => D::TriggerDialogControl {
            control_id: bits.read_signed_offset32()?,
            event_type: bits.read_signed_offset32()?,
            event_data: dialog_event(bits, layout)?,
        },
        EventKind::TriggerSoundLengthSync(layout) => {
            let count_bits = match layout {
                SoundSyncLayout::Bytes => 8,
                SoundSyncLayout::Bits7 => 7,
            };
            D::TriggerSoundLengthSync {
                sound_hash: bits.list_of(count_bits, |b| b.read_u32())?,
                length: bits.list_of(count_bits, |b| b.read_u32())?,
            }
        }
        EventKind::TriggerConversationSkipped => D::TriggerConversationSkipped {
            skip_type: bits.read_int(1)? as i8,
        },
        EventKind::TriggerMouseClicked(layout) => {
            D::TriggerMouseClicked(mouse_clicked(bits, layout)?)
        }
        EventKind::TriggerMouseMoved(layout) => D::TriggerMouseMoved(mouse_moved(bits, layout)?),
        EventKind::AchievementAwarded => D::AchievementAwarded {
            achievement_link: bits.read_u16()?,
        },
        EventKind::TriggerTargetModeUpdate => D::TriggerTargetModeUpdate {
            ability_link: bits.read_u16()?,
            ability_command_index: bits.read_bits(5)? as u8,
            state: bits.read_signed_offset8()?,
        },
        EventKind::TriggerPlanetPanelReplay => D::TriggerPlanetPanelReplay,
        EventKind::TriggerSoundtrackDone => D::TriggerSoundtrackDone {
            soundtrack: bits.read_u32()?,
        },
        EventKind::TriggerPlanetMissionSelected => D::TriggerPlanetMissionSelected {
            planet_id: bits.read_signed_offset32()?,
        },
        EventKind::TriggerKeyPressed => D::TriggerKeyPressed {
            key: bits.read_signed_offset8()?,
            flags: bits.read_signed_offset8()?,
        },
        EventKind::TriggerMovieFunction => D::TriggerMovieFunction {
            function_name: text(bits, 7)?,
        },
        EventKind::TriggerPlanetPanelBirthComplete => D::TriggerPlanetPanelBirthComplete,
        EventKind::TriggerPlanetPanelDeathComplete => D::TriggerPlanetPanelDeathComplete,
        EventKind::ResourceRequest => D::ResourceRequest {
            resources: resources(bits)?,
        },
        EventKind::ResourceRequestFulfill => D::ResourceRequestFulfill {
            request_id: bits.read_signed_offset32()?,
        },
        EventKind::ResourceRequestCancel => D::ResourceRequestCancel {
            request_id: bits.read_signed_offset32()?,
        },
        EventKind::TriggerResearchPanelExit => D::TriggerResearchPanelExit,
        EventKind::TriggerResearchPanelPurchase => D::TriggerResearchPanelPurchase,
        EventKind::TriggerResearchPanelSelectionChanged => {
            D::TriggerResearchPanelSelectionChanged {
                item_id: bits.read_signed_offset32()?,
            }
        }
        EventKind::LagMessage => D::LagMessage {
            player_id: player_id(bits)?,
        },
        EventKind::TriggerMercenaryPanelExit => D::TriggerMercenaryPanelExit,
        EventKind::TriggerMercenaryPanelPurchase => D::TriggerMercenaryPanelPurchase,
        EventKind::TriggerMercenaryPanelSelectionChanged => {
            D::TriggerMercenaryPanelSelectionChanged {
                item_id: bits.read_signed_offset32()?,
            }
        }
        EventKind::TriggerVictoryPanelExit => D::TriggerVictoryPanelExit,
        EventKind::TriggerBattleReportPanelExit => D::TriggerBattleReportPanelExit,
        EventKind::TriggerBattleReportPanelPlayMission => {
            D::TriggerBattleReportPanelPlayMission {
                battle_report_id: bits.read_signed_offset32()?,
                difficulty_level: bits.read_signed_offset32()?,
            }
        }
        EventKind::TriggerBattleReportPanelPlayScene => D::TriggerBattleReportPanelPlayScene {
            battle_report_id: bits.read_signed_offset32()?,
        },
        EventKind::TriggerBattleReportPanelSelectionChanged => {
            D::TriggerBattleReportPanelSelectionChanged {
                battle_report_id: bits.read_signed_offset32()?,
            }
        }
        EventKind::TriggerVictoryPanelPlayMissionAgain => {
            D::TriggerVictoryPanelPlayMissionAgain {
                difficulty_level: bits.read_signed_offset32()?,
            }
        }
        EventKind::TriggerMovieStarted => D::TriggerMovieStarted,
        EventKind::TriggerMovieFinished => D::TriggerMovieFinished,
        EventKind::DecrementGameTimeRemaining(layout) => {
            let width = match layout {
                DecrementLayout::Bits32 => 32,
                DecrementLayout::Bits19 => 19,
            };
            D::DecrementGameTimeRemaining {
                decrement_ms: bits.read_bits(width)? as u32,
            }
        }
        EventKind::TriggerPortraitLoaded => D::TriggerPortraitLoaded {
            portrait_id: bits.read_signed_offset32()?,
        },
        EventKind::TriggerCustomDialogDismissed => D::TriggerCustomDialogDismissed {
            result: bits.read_signed_offset32()?,
        },
        EventKind::TriggerGameMenuItemSelected => D::TriggerGameMenuItemSelected {
            game_menu_item_index: bits.read_signed_offset32()?,
        },
        EventKind::TriggerCameraMove => D::TriggerCameraMove {
            reason: bits.read_signed_offset8()?,
        },
        EventKind::TriggerPurchasePanelSelectedPurchaseItemChanged => {
            D::TriggerPurchasePanelSelectedPurchaseItemChanged {
                item_id: bits.read_signed_offset32()?,
            }
        }
        EventKind::TriggerPurchasePanelSelectedPurchaseCategoryChanged => {
            D::TriggerPurchasePanelSelectedPurchaseCategoryChanged {
                category_id: bits.read_signed_offset32()?,
            }
        }
        EventKind::TriggerButtonPressed => D::TriggerButtonPressed {
            button: bits.read_u16()?,
        },
        EventKind::TriggerGameCreditsFinished => D::TriggerGameCreditsFinished,
        EventKind::TriggerCutsceneBookmarkFired => D::TriggerCutsceneBookmarkFired {
            cutscene_id: bits.read_signed_offset32()?,
            bookmark_name: text(bits, 7)?,
        },
        EventKind::TriggerCutsceneEndSceneFired => D::TriggerCutsceneEndSceneFired {
            cutscene_id: bits.read_signed_offset32()?,
        },
        EventKind::TriggerCutsceneConversationLine => D::TriggerCutsceneConversationLine {
            cutscene_id: bits.read_signed_offset32()?,
            conversation_line: text(bits, 7)?,
            alt_conversation_line: text(bits, 7)?,
        },
        EventKind::TriggerCutsceneConversationLineMissing => {
            D::TriggerCutsceneConversationLineMissing {
                cutscene_id: bits.read_signed_offset32()?,
                conversation_line: text(bits, 7)?,
            }
        }
    };

    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::BitWriter;

    fn parse(kind: EventKind, data: &[u8]) -> GameEventData {
        let mut bits = BitReader::new(data);
        let res = read_payload(kind, &mut bits).unwrap();
        assert!(bits.bits_remaining() < 8, "payload not consumed");
        res
    }

    #[test]
    fn test_legacy_command() {
        let mut w = BitWriter::new();
        w.write_u32(0x100);
        w.write_u16(0x0f05);
        w.write_u8(1);
        w.write_u8(0);
        w.write_u8(4);
        w.write_u8(9);
        w.write_u32(77);
        w.write_u32(0x0420_0001);
        w.write_u16(0x55);
        w.write_bool(true);
        w.write_bits(2, 4);
        w.write_i32(100);
        w.write_i32(-200);
        w.write_i32(0);

        let data = w.finish();
        let res = parse(EventKind::Command(CommandLayout::Legacy), &data);
        assert_eq!(
            res,
            GameEventData::Command(Command {
                flags: 0x100,
                ability: Some(Ability {
                    ability_link: 0x0f05,
                    ability_command_index: 1,
                    ability_command_data: Some(0),
                }),
                data: CommandData::TargetUnit(TargetUnit {
                    flags: 4,
                    timer: 9,
                    unit_tag: 0x0420_0001,
                    unit_link: 0x55,
                    control_player_id: Versioned::Missing,
                    upkeep_player_id: Some(2),
                    point: Point3 {
                        x: 100,
                        y: -200,
                        z: 0
                    },
                }),
                other_unit_tag: Some(77),
            })
        );
    }

    #[test]
    fn test_command_target_point() {
        let mut w = BitWriter::new();
        w.write_bits(0x8_0000, 20);
        w.write_bool(true);
        w.write_u16(3);
        w.write_bits(0, 5);
        w.write_bool(false);
        w.write_bits(1, 2);
        w.write_bits(4096, 20);
        w.write_bits(8192, 20);
        w.write_i32(-1);
        w.write_bool(false);

        let data = w.finish();
        let res = parse(EventKind::Command(CommandLayout::Flags20), &data);
        assert_eq!(
            res,
            GameEventData::Command(Command {
                flags: 0x8_0000,
                ability: Some(Ability {
                    ability_link: 3,
                    ability_command_index: 0,
                    ability_command_data: None,
                }),
                data: CommandData::TargetPoint(Point3 {
                    x: 4096,
                    y: 8192,
                    z: -1
                }),
                other_unit_tag: None,
            })
        );
    }

    #[test]
    fn test_command_target_unit_control_player() {
        let mut w = BitWriter::new();
        w.write_bits(0, 18);
        w.write_bool(false);
        w.write_bits(2, 2);
        w.write_u8(1);
        w.write_u8(2);
        w.write_u32(3);
        w.write_u16(4);
        w.write_bool(true);
        w.write_bits(5, 4);
        w.write_bool(false);
        w.write_bits(6, 20);
        w.write_bits(7, 20);
        w.write_i32(8);
        w.write_bool(true);
        w.write_u32(9);

        let data = w.finish();
        let with_control = parse(EventKind::Command(CommandLayout::Flags18Control), &data);
        match with_control {
            GameEventData::Command(Command {
                data: CommandData::TargetUnit(target),
                other_unit_tag,
                ..
            }) => {
                assert_eq!(target.control_player_id, Versioned::Present(Some(5)));
                assert_eq!(target.upkeep_player_id, None);
                assert_eq!(target.point, Point3 { x: 6, y: 7, z: 8 });
                assert_eq!(other_unit_tag, Some(9));
            }
            x => panic!("unexpected {:?}", x),
        }

        // the same bits without the control player are one field out of step
        let mut bits = BitReader::new(&data);
        let res = read_payload(EventKind::Command(CommandLayout::Flags18), &mut bits).unwrap();
        match res {
            GameEventData::Command(Command {
                data: CommandData::TargetUnit(target),
                ..
            }) => {
                assert_eq!(target.control_player_id, Versioned::Missing);
                assert_eq!(target.upkeep_player_id, Some(5));
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn test_wide_selection_delta_indices() {
        let mut w = BitWriter::new();
        w.write_bits(3, 4);
        w.write_bits(300, 9);
        w.write_bits(3, 2);
        w.write_bits(2, 9);
        w.write_bits(0, 9);
        w.write_bits(257, 9);
        w.write_bits(1, 9);
        w.write_u16(0x2f);
        w.write_u8(7);
        w.write_u8(1);
        w.write_bits(12, 9);
        w.write_bits(1, 9);
        w.write_u32(0xabc);

        let data = w.finish();
        let res = parse(
            EventKind::SelectionDelta(SelectionLayout::WidePriority),
            &data,
        );
        assert_eq!(
            res,
            GameEventData::SelectionDelta(SelectionDelta {
                control_group_index: 3,
                subgroup_index: 300,
                remove_mask: RemoveMask::ZeroIndices(vec![0, 257]),
                add_subgroups: vec![Subgroup {
                    unit_link: 0x2f,
                    subgroup_priority: Versioned::Present(7),
                    intra_subgroup_priority: 1,
                    count: 12,
                }],
                add_unit_tags: vec![0xabc],
            })
        );
    }

    #[test]
    fn test_legacy_selection_delta_mask() {
        let mut w = BitWriter::new();
        w.write_bits(10, 4);
        w.write_u8(0);
        w.write_u8(3);
        w.write_bits(0b101, 3);
        w.write_u8(0);
        w.write_u8(0);

        let data = w.finish();
        match parse(EventKind::SelectionDelta(SelectionLayout::Legacy), &data) {
            GameEventData::SelectionDelta(delta) => {
                assert_eq!(delta.control_group_index, 10);
                match delta.remove_mask {
                    RemoveMask::Mask(mask) => assert_eq!(mask.len(), 3),
                    x => panic!("unexpected {:?}", x),
                }
                assert!(delta.add_subgroups.is_empty());
                assert!(delta.add_unit_tags.is_empty());
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn test_legacy_control_group_without_mask() {
        let mut w = BitWriter::new();
        w.write_bits(1, 4);
        w.write_bits(2, 2);
        w.write_bool(false);

        let data = w.finish();
        assert_eq!(
            parse(EventKind::ControlGroupUpdate(SelectionLayout::Legacy), &data),
            GameEventData::ControlGroupUpdate(ControlGroupUpdate {
                control_group_index: 1,
                control_group_update: 2,
                remove_mask: RemoveMask::None,
            })
        );
    }

    #[test]
    fn test_control_group_one_indices() {
        let mut w = BitWriter::new();
        w.write_bits(0, 4);
        w.write_bits(0, 2);
        w.write_bits(2, 2);
        w.write_u8(2);
        w.write_u8(4);
        w.write_u8(9);

        let data = w.finish();
        assert_eq!(
            parse(EventKind::ControlGroupUpdate(SelectionLayout::Choice), &data),
            GameEventData::ControlGroupUpdate(ControlGroupUpdate {
                control_group_index: 0,
                control_group_update: 0,
                remove_mask: RemoveMask::OneIndices(vec![4, 9]),
            })
        );
    }

    #[test]
    fn test_user_options_layouts() {
        let mut w = BitWriter::new();
        for b in [true, false, true, false, true, true] {
            w.write_bool(b);
        }
        w.write_u32(23925);
        let data = w.finish();

        assert_eq!(
            parse(EventKind::UserOptions(UserOptionsLayout::HotsBeta), &data),
            GameEventData::UserOptions(UserOptions {
                game_fully_downloaded: Versioned::Present(true),
                development_cheats_enabled: false,
                multiplayer_cheats_enabled: true,
                sync_checksumming_enabled: false,
                is_map_to_map_transition: true,
                starting_rally: Versioned::Present(true),
                use_ai_beacons: Versioned::Missing,
                base_build_num: Versioned::Present(23925),
            })
        );

        let data = [0b0000_1010];
        match parse(EventKind::UserOptions(UserOptionsLayout::Base), &data) {
            GameEventData::UserOptions(options) => {
                assert_eq!(options.game_fully_downloaded, Versioned::Missing);
                assert!(!options.development_cheats_enabled);
                assert!(options.multiplayer_cheats_enabled);
                assert!(options.is_map_to_map_transition);
                assert_eq!(options.use_ai_beacons, Versioned::Missing);
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn test_camera_update_layouts() {
        let mut w = BitWriter::new();
        w.write_bool(false);
        w.write_bool(true);
        w.write_u16(1500);
        w.write_bool(false);
        w.write_bool(false);
        let data = w.finish();

        assert_eq!(
            parse(EventKind::CameraUpdate(CameraLayout::TargetOptional), &data),
            GameEventData::CameraUpdate(CameraUpdate {
                target: None,
                distance: Some(1500),
                pitch: None,
                yaw: None,
            })
        );

        let mut w = BitWriter::new();
        w.write_u16(10);
        w.write_u16(20);
        w.write_bits(0, 3);
        let data = w.finish();
        match parse(EventKind::CameraUpdate(CameraLayout::TargetRequired), &data) {
            GameEventData::CameraUpdate(camera) => {
                assert_eq!(camera.target, Some(CameraTarget { x: 10, y: 20 }))
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn test_dialog_mouse_button_needs_layout() {
        let mut w = BitWriter::new();
        w.write_i32(1);
        w.write_i32(2);
        w.write_bits(5, 3);
        w.write_u32(3);
        let data = w.finish();

        assert_eq!(
            parse(EventKind::TriggerDialogControl(DialogLayout::MouseButton), &data),
            GameEventData::TriggerDialogControl {
                control_id: 1,
                event_type: 2,
                event_data: DialogEvent::MouseButton(3),
            }
        );

        let mut bits = BitReader::new(&data);
        let err =
            read_payload(EventKind::TriggerDialogControl(DialogLayout::Base), &mut bits).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidChoice {
                field: "dialog event",
                tag: 5,
                bit_pos: 64
            }
        );
    }

    #[test]
    fn test_mouse_events() {
        let mut w = BitWriter::new();
        w.write_bits(640, 11);
        w.write_bits(480, 11);
        w.write_bits(1000, 20);
        w.write_bits(2000, 20);
        w.write_i32(-5);
        w.write_i8(-3);
        let data = w.finish();

        assert_eq!(
            parse(EventKind::TriggerMouseMoved(MouseLayout::Flagged), &data),
            GameEventData::TriggerMouseMoved(MouseMoved {
                position_ui: UiPoint { x: 640, y: 480 },
                position_world: Point3 {
                    x: 1000,
                    y: 2000,
                    z: -5
                },
                flags: Versioned::Present(-3),
            })
        );

        let mut w = BitWriter::new();
        w.write_u32(1);
        w.write_bool(true);
        w.write_u32(640);
        w.write_u32(480);
        w.write_i32(1);
        w.write_i32(2);
        w.write_i32(3);
        let data = w.finish();
        match parse(EventKind::TriggerMouseClicked(MouseLayout::Base), &data) {
            GameEventData::TriggerMouseClicked(click) => {
                assert!(click.down);
                assert_eq!(click.position_ui, UiPoint { x: 640, y: 480 });
                assert_eq!(click.flags, Versioned::Missing);
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn test_bank_signature_with_toon() {
        let mut w = BitWriter::new();
        w.write_bits(2, 5);
        w.write_u8(0xaa);
        w.write_u8(0xbb);
        w.write_string("2-S2-1-123", 7);
        let data = w.finish();

        assert_eq!(
            parse(EventKind::BankSignature(SignatureLayout::WithToon), &data),
            GameEventData::BankSignature {
                signature: vec![0xaa, 0xbb],
                toon_handle: Versioned::Present(String::from("2-S2-1-123")),
            }
        );
    }

    #[test]
    fn test_hijack_replay() {
        let mut w = BitWriter::new();
        w.write_bits(1, 5);
        w.write_bits(3, 4);
        w.write_bits(0, 2);
        w.write_string("Kerrigan", 8);
        w.write_bool(false);
        w.write_bool(true);
        w.write_string("SWRM", 8);
        w.write_bits(1, 1);
        let data = w.finish();

        assert_eq!(
            parse(EventKind::HijackReplayGame, &data),
            GameEventData::HijackReplayGame {
                user_infos: vec![HijackUser {
                    game_unit_id: 3,
                    observe: 0,
                    name: String::from("Kerrigan"),
                    toon_handle: None,
                    clan_tag: Some(String::from("SWRM")),
                }],
                method: 1,
            }
        );
    }

    #[test]
    fn test_ai_communicate_wide() {
        let mut w = BitWriter::new();
        w.write_i8(1);
        w.write_i8(-1);
        w.write_i8(0);
        w.write_i8(5);
        w.write_u32(44);
        w.write_u16(45);
        w.write_u8(2);
        w.write_u8(3);
        w.write_i32(10);
        w.write_i32(20);
        w.write_i32(30);
        let data = w.finish();

        match parse(EventKind::AiCommunicate(AiLayout::V22612), &data) {
            GameEventData::AiCommunicate(ai) => {
                assert_eq!(ai.ally, -1);
                assert_eq!(ai.build, Versioned::Present(5));
                assert_eq!(ai.target_upkeep_player_id, Some(2));
                assert_eq!(ai.target_control_player_id, Versioned::Present(Some(3)));
                assert_eq!(ai.target_point, Point3 { x: 10, y: 20, z: 30 });
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn test_simple_payloads() {
        let mut w = BitWriter::new();
        w.write_bits(0x3ffff, 19);
        let data = w.finish();
        assert_eq!(
            parse(
                EventKind::DecrementGameTimeRemaining(DecrementLayout::Bits19),
                &data
            ),
            GameEventData::DecrementGameTimeRemaining {
                decrement_ms: 0x3ffff
            }
        );

        assert_eq!(
            parse(EventKind::TriggerConversationSkipped, &[0xff]),
            GameEventData::TriggerConversationSkipped { skip_type: -1 }
        );
        assert_eq!(
            parse(EventKind::Unknown, &[1, 2]),
            GameEventData::Unknown { data: vec![1, 2] }
        );
        assert_eq!(
            parse(EventKind::PlayerLeave, &[]),
            GameEventData::PlayerLeave
        );
    }

    #[test]
    fn test_truncated_payload() {
        let mut bits = BitReader::new(&[0x00, 0x01]);
        let err = read_payload(EventKind::UnitClick, &mut bits).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedInput { .. }));
    }
}
