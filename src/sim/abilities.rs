//! Ability and adrenaline state machines
//!
//! Activation is shared by the player intents and the held input keys; both
//! are cooldown-gated so repeated requests are harmless no-ops.

use super::effects::{TextTone, floating_text};
use super::entities::{AbilityKind, Tank};
use super::factory::create_emp;
use super::state::{GameState, GameStatus};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Activate the player's ability
///
/// Returns false when there is no player, the run is not in play, or the
/// ability is cooling down or already active.
pub fn activate_ability(state: &mut GameState) -> bool {
    if state.status != GameStatus::Playing {
        return false;
    }
    let Some(player) = state.player.as_mut() else {
        return false;
    };
    if !player.ability.is_ready() {
        return false;
    }

    let kind = player.ability.kind;
    let center = player.body.center();
    player.ability.cooldown = player.ability.max_cooldown;
    match kind {
        AbilityKind::AegisShield => {
            player.ability.active = true;
            player.ability.timer = kind.duration();
            player.grant_invincibility(kind.duration());
        }
        AbilityKind::Overdrive | AbilityKind::GoldenBullet => {
            player.ability.active = true;
            player.ability.timer = kind.duration();
        }
        AbilityKind::QuickRepair => {
            let amount = player.max_health * 0.4;
            player.heal(amount);
            state.effects.floating_texts.push(floating_text(
                center,
                format!("+{}", amount.round()),
                TextTone::Heal,
                60.0,
            ));
        }
        AbilityKind::EmpBlast => {
            let id = state.alloc_id();
            state.emp_blasts.push(create_emp(id, center));
            state.effects.screen_shake.trigger(6.0, 15.0);
        }
        AbilityKind::None => return false,
    }
    state.play(SoundEffect::Ability(kind));
    log::debug!("Ability {:?} activated", kind);
    true
}

/// Spend a full adrenaline meter on the piercing/fire-rate buff
pub fn activate_adrenaline(state: &mut GameState) -> bool {
    if state.status != GameStatus::Playing {
        return false;
    }
    let Some(player) = state.player.as_mut() else {
        return false;
    };
    if !player.adrenaline.is_full() || player.adrenaline.is_active() {
        return false;
    }
    player.adrenaline.meter = 0.0;
    player.adrenaline.timer = ADRENALINE_DURATION;
    let center = player.body.center();
    state.effects.floating_texts.push(floating_text(
        center,
        "ADRENALINE!",
        TextTone::Streak,
        90.0,
    ));
    state.play(SoundEffect::Adrenaline);
    true
}

/// Count down ability, adrenaline and power-up timers
///
/// Effective stats are derived from these timers, so expiry needs no revert.
pub fn tick_buffs(tank: &mut Tank, dt: f32) {
    let slot = &mut tank.ability;
    slot.cooldown = (slot.cooldown - dt).max(0.0);
    // A golden bullet stays armed until the next shot
    if slot.active && slot.kind != AbilityKind::GoldenBullet {
        slot.timer -= dt;
        if slot.timer <= 0.0 {
            slot.timer = 0.0;
            slot.active = false;
        }
    }

    if tank.adrenaline.timer > 0.0 {
        tank.adrenaline.timer = (tank.adrenaline.timer - dt).max(0.0);
    }
    if tank.rapid_fire_timer > 0.0 {
        tank.rapid_fire_timer = (tank.rapid_fire_timer - dt).max(0.0);
    }

    if tank.invincible {
        tank.invincibility_timer -= dt;
        if tank.invincibility_timer <= 0.0 {
            tank.invincibility_timer = 0.0;
            tank.invincible = false;
        }
    }
}

/// Consume the armed golden round after a shot
pub fn spend_golden(tank: &mut Tank) {
    if tank.ability.is_active(AbilityKind::GoldenBullet) {
        tank.ability.active = false;
        tank.ability.timer = 0.0;
    } else if tank.golden_charges > 0 {
        tank.golden_charges -= 1;
    }
}
