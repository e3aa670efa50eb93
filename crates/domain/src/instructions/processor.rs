//! Instruction processor - applies an ordered batch of edits to a cartridge
//!
//! The batch runs against a working copy; the caller's cartridge is never touched.
//! Any failing instruction aborts the whole batch with [`InstructionError`]. After
//! the last instruction the trigger-id sanitation pass always runs.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::entities::{
    Cartridge, Character, Place, ProfilePatch, Scene, ScenePatch, Sprite, StylePatch, Trigger,
    TriggerRecord,
};
use crate::error::DomainError;
use crate::ids::{CharacterId, PlaceId, SceneId, TriggerId};
use crate::instructions::{sanitize_trigger_ids, EntityKind, Instruction, Operation, RawInstruction};

/// A batch failure, pointing at the instruction that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("instruction {index} ({operation} {entity}{}) failed: {source}", target_suffix(.target))]
pub struct InstructionError {
    pub index: usize,
    pub operation: Operation,
    pub entity: EntityKind,
    pub target: Option<String>,
    #[source]
    pub source: DomainError,
}

fn target_suffix(target: &Option<String>) -> String {
    target
        .as_deref()
        .map(|id| format!(" {id}"))
        .unwrap_or_default()
}

impl InstructionError {
    fn from_raw(index: usize, raw: &RawInstruction, source: DomainError) -> Self {
        Self {
            index,
            operation: raw.operation,
            entity: raw.entity,
            target: raw.uuid.clone(),
            source,
        }
    }
}

/// Apply `instructions` in order, returning the edited cartridge.
pub fn apply_instructions(
    cartridge: &Cartridge,
    instructions: Vec<Instruction>,
) -> Result<Cartridge, InstructionError> {
    let mut working = cartridge.clone();

    for (index, instruction) in instructions.into_iter().enumerate() {
        let context = InstructionContext::of(&instruction);
        apply_one(&mut working, instruction).map_err(|source| context.into_error(index, source))?;
    }

    sanitize_trigger_ids(&mut working);
    Ok(working)
}

/// Convert and apply a loosely-typed batch.
///
/// Conversion happens for the whole batch before anything is applied.
pub fn apply_raw_instructions(
    cartridge: &Cartridge,
    raw: Vec<RawInstruction>,
) -> Result<Cartridge, InstructionError> {
    let instructions = raw
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            Instruction::try_from(raw.clone())
                .map_err(|source| InstructionError::from_raw(index, &raw, source))
        })
        .collect::<Result<Vec<_>, _>>()?;

    apply_instructions(cartridge, instructions)
}

struct InstructionContext {
    operation: Operation,
    entity: EntityKind,
    target: Option<String>,
}

impl InstructionContext {
    fn of(instruction: &Instruction) -> Self {
        Self {
            operation: instruction.operation(),
            entity: instruction.entity(),
            target: instruction.target().map(str::to_string),
        }
    }

    fn into_error(self, index: usize, source: DomainError) -> InstructionError {
        InstructionError {
            index,
            operation: self.operation,
            entity: self.entity,
            target: self.target,
            source,
        }
    }
}

fn apply_one(cartridge: &mut Cartridge, instruction: Instruction) -> Result<(), DomainError> {
    match instruction {
        Instruction::CreateScene(patch) => {
            create_scene(cartridge, patch);
            Ok(())
        }
        Instruction::EditScene { id, patch } => edit_scene(cartridge, &id, patch),
        Instruction::DeleteScene { id } => {
            let position = scene_position(cartridge, &id)?;
            cartridge.scenes.remove(position);
            Ok(())
        }

        Instruction::CreateCharacter(patch) => {
            let character = Character {
                id: CharacterId::generate(),
                name: patch.name.unwrap_or_default(),
                description: patch.description.unwrap_or_default(),
                sprites: patch.sprites.unwrap_or_default(),
            };
            cartridge.characters.push(character);
            Ok(())
        }
        Instruction::EditCharacter { id, patch } => {
            let character = cartridge
                .characters
                .iter_mut()
                .find(|character| character.id == id)
                .ok_or_else(|| DomainError::not_found("Character", id.as_str()))?;
            merge_profile(
                &mut character.name,
                &mut character.description,
                &mut character.sprites,
                patch,
            );
            Ok(())
        }
        Instruction::DeleteCharacter { id } => delete_character(cartridge, &id),

        Instruction::CreatePlace(patch) => {
            let place = Place {
                id: PlaceId::generate(),
                name: patch.name.unwrap_or_default(),
                description: patch.description.unwrap_or_default(),
                sprites: patch.sprites.unwrap_or_default(),
            };
            cartridge.places.push(place);
            Ok(())
        }
        Instruction::EditPlace { id, patch } => {
            let place = cartridge
                .places
                .iter_mut()
                .find(|place| place.id == id)
                .ok_or_else(|| DomainError::not_found("Place", id.as_str()))?;
            merge_profile(&mut place.name, &mut place.description, &mut place.sprites, patch);
            Ok(())
        }
        Instruction::DeletePlace { id } => {
            // Scenes keep dangling place references; only rosters are cleaned.
            let position = cartridge
                .places
                .iter()
                .position(|place| place.id == id)
                .ok_or_else(|| DomainError::not_found("Place", id.as_str()))?;
            cartridge.places.remove(position);
            Ok(())
        }

        Instruction::CreateTrigger { scene_id, patch } => {
            let scene = scene_mut(cartridge, &scene_id)?;
            let trigger = patch.into_trigger(TriggerId::generate_in(&scene.id));
            scene.triggers.push(trigger);
            Ok(())
        }
        Instruction::EditTrigger { id, patch } => edit_trigger(cartridge, &id, patch),
        Instruction::DeleteTrigger { id } => {
            let scene_id = id.scene_id()?;
            let scene = scene_mut(cartridge, &scene_id)?;
            scene.triggers.retain(|trigger| trigger.id != id);
            Ok(())
        }

        Instruction::EditStyle(StylePatch { prompt }) => {
            if let Some(prompt) = prompt {
                cartridge.style.prompt = prompt;
            }
            Ok(())
        }
    }
}

fn scene_position(cartridge: &Cartridge, id: &SceneId) -> Result<usize, DomainError> {
    cartridge
        .scenes
        .iter()
        .position(|scene| &scene.id == id)
        .ok_or_else(|| DomainError::not_found("Scene", id.as_str()))
}

fn scene_mut<'a>(cartridge: &'a mut Cartridge, id: &SceneId) -> Result<&'a mut Scene, DomainError> {
    let position = scene_position(cartridge, id)?;
    Ok(&mut cartridge.scenes[position])
}

/// Trigger records carried in a scene body; missing ids get one in the scene's namespace.
fn scene_triggers(scene_id: &SceneId, records: Vec<TriggerRecord>) -> Vec<Trigger> {
    records
        .into_iter()
        .map(|mut record| {
            let id = record
                .id
                .take()
                .unwrap_or_else(|| TriggerId::generate_in(scene_id));
            record.into_trigger(id)
        })
        .collect()
}

fn create_scene(cartridge: &mut Cartridge, patch: ScenePatch) {
    let id = SceneId::generate();
    let triggers = scene_triggers(&id, patch.triggers.unwrap_or_default());

    cartridge.scenes.push(Scene {
        title: patch.title.unwrap_or_default(),
        character_ids: patch.character_ids.unwrap_or_default(),
        place_id: patch.place_id.flatten(),
        script: patch.script.unwrap_or_default(),
        triggers,
        prompt: patch.prompt,
        id,
    });
}

fn edit_scene(cartridge: &mut Cartridge, id: &SceneId, patch: ScenePatch) -> Result<(), DomainError> {
    let scene = scene_mut(cartridge, id)?;

    if let Some(title) = patch.title {
        scene.title = title;
    }
    if let Some(character_ids) = patch.character_ids {
        scene.character_ids = character_ids;
    }
    if let Some(place_id) = patch.place_id {
        scene.place_id = place_id;
    }
    if let Some(script) = patch.script {
        scene.script = script;
    }
    if let Some(records) = patch.triggers {
        scene.triggers = scene_triggers(&scene.id, records);
    }
    if let Some(prompt) = patch.prompt {
        scene.prompt = Some(prompt);
    }

    Ok(())
}

fn merge_profile(
    name: &mut String,
    description: &mut String,
    sprites: &mut BTreeMap<String, Sprite>,
    patch: ProfilePatch,
) {
    if let Some(value) = patch.name {
        *name = value;
    }
    if let Some(value) = patch.description {
        *description = value;
    }
    if let Some(value) = patch.sprites {
        *sprites = value;
    }
}

fn delete_character(cartridge: &mut Cartridge, id: &CharacterId) -> Result<(), DomainError> {
    let position = cartridge
        .characters
        .iter()
        .position(|character| &character.id == id)
        .ok_or_else(|| DomainError::not_found("Character", id.as_str()))?;
    cartridge.characters.remove(position);

    for scene in &mut cartridge.scenes {
        scene.character_ids.retain(|character_id| character_id != id);
    }
    Ok(())
}

fn edit_trigger(cartridge: &mut Cartridge, id: &TriggerId, patch: TriggerRecord) -> Result<(), DomainError> {
    let scene_id = id.scene_id()?;
    let scene = scene_mut(cartridge, &scene_id)?;
    let existing = scene
        .triggers
        .iter_mut()
        .find(|trigger| &trigger.id == id)
        .ok_or_else(|| DomainError::not_found("Trigger", id.as_str()))?;

    let merged = patch.merged_over(TriggerRecord::from(existing.clone()));
    *existing = merged.into_trigger(id.clone());
    Ok(())
}
