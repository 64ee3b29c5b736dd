/*!

This is the long-form manual for `power_index` and `coalsim`.

## Reports

Three reports are available. They all take a roster: a list of entities
(states, territories) with a positive weight (delegates, electoral votes),
and a quota, the weight needed to win.

### `banzhaf`

The exact Banzhaf power index. For each entity, it counts the coalitions of
the other entities that fall short of the quota by less than the weight of
this entity: in these coalitions, the entity is a swing vote. The counts are
then normalized so that they sum to 1.

The computation is exact and does not depend on the order of the roster.

### `simulate`

A Monte Carlo simulation of a race between two sides, A and B. At each trial,
the entities vote in roster order and each one flips a fair coin. As soon as
one side reaches the quota, the race is over and the remaining entities do
not vote. When side A wins, every entity that sided with A is counted as part
of the winning coalition.

The order of the roster matters: an entity late in the calendar is less
likely to vote at all, and therefore less likely to be part of a winning
coalition.

| column      | meaning                                                   |
|-------------|-----------------------------------------------------------|
| count       | trials in which the entity was in side A's winning coalition |
| percentage  | count divided by the number of trials                     |

### `scenario`

The same simulation, with some entities forced to one side. Forced entities
do not flip a coin. The report adds the `power` column (the count divided by
the sum of all the counts) and the probabilities of each side winning.

The `power` column is an estimate under the scenario. It is not the Banzhaf
index and the two reports are not expected to agree.

## Configuration

`coalsim` reads a configuration file in JSON:

```text
{
  "outputSettings": { "contestName": "2024 primary" },
  "roster": { "preset": "primary" },
  "rules": { "mode": "scenario", "trials": "100000", "randomSeed": "42" },
  "scenario": [ { "id": "IA", "outcome": "sideA" } ]
}
```

- `roster.preset` (string, optional): `primary` for the 2024 Republican
  primary calendar (quota 1234), `electoral` for the electoral college
  (quota 270).
- `roster.entities` (array, optional): `{"id": ..., "weight": ...}` objects,
  in voting order. Takes precedence over the preset.
- `rules.mode`: `banzhaf`, `simulate` or `scenario`.
- `rules.quota` (string or number): required unless a preset is used.
- `rules.trials` (string or number, default 10000).
- `rules.randomSeed` (string, optional): makes the simulation reproducible.
- `scenario` (array, optional): `outcome` is `sideA`, `sideB` or
  `unconstrained`.

All the options can also be passed on the command line, which overrides the
configuration file. A `--preset` flag also brings the quota of that preset,
unless `--quota` is given too. The exact index supports rosters of at most
127 entities and a total weight of at most 1,000,000.

```bash
coalsim --preset electoral --mode banzhaf
coalsim --preset primary --mode scenario --trials 100000 --force IA=A --force NH=B
```

 */
