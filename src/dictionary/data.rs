use crate::types::Sentence;

use super::{Effects, ThoughtDef};

pub const THOUGHTS: &[ThoughtDef] = &[
    ThoughtDef::bother("did i lock the door"),
    ThoughtDef::calming("i did lock the door"),
    ThoughtDef::worrying("i did not lock the door").with_effect(door_left_open),
    ThoughtDef::bother("what was that noise"),
    ThoughtDef::calming("that noise was no thing"),
    ThoughtDef::calming("that was no noise"),
    ThoughtDef::worrying("that noise was some one").with_effect(someone_is_here),
    ThoughtDef::bother("some thing is wrong"),
    ThoughtDef::calming("no thing is wrong"),
    ThoughtDef::worrying("some thing is very wrong"),
    ThoughtDef::bother("no no no"),
    ThoughtDef::bother("will i sleep"),
    ThoughtDef::calming("i will sleep"),
    ThoughtDef::worrying("i will not sleep").with_effect(restless),
    ThoughtDef::bother("who is there"),
    ThoughtDef::calming("no one is there"),
    ThoughtDef::worrying("some one is there").with_effect(heard_a_noise),
    ThoughtDef::bother("can i rest"),
    ThoughtDef::calming("i can rest"),
    ThoughtDef::worrying("i can not rest"),
    ThoughtDef::bother("am i comfort able"),
    ThoughtDef::calming("i am comfort able"),
    ThoughtDef::worrying("i am not comfort able"),
    ThoughtDef::bother("how will i wake"),
    ThoughtDef::calming("i will wake"),
    ThoughtDef::worrying("i will not wake"),
    ThoughtDef::bother("why can i not sleep"),
    ThoughtDef::calming("i can sleep"),
    ThoughtDef::worrying("i can not sleep").with_effect(restless),
    ThoughtDef::bother("is some one there"),
    ThoughtDef::bother("it is very late"),
    ThoughtDef::calming("it is late"),
];

fn door_left_open(sentence: &Sentence, effects: &mut Effects) {
    effects.replace(sentence.id, "did i lock the door");
}

fn someone_is_here(sentence: &Sentence, effects: &mut Effects) {
    effects.remove(sentence.id);
    effects.spawn("who is there");
}

fn heard_a_noise(sentence: &Sentence, effects: &mut Effects) {
    effects.remove(sentence.id);
    effects.spawn("what was that noise");
}

fn restless(sentence: &Sentence, effects: &mut Effects) {
    effects.remove(sentence.id);
    effects.spawn_random();
}
