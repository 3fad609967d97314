mod lists;
mod sorted_sets;
mod streams;
mod strings;
